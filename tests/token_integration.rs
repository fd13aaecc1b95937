use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose, Engine};
use ghost_jwt::comms::http_api::{create_router, AppState};
use ghost_jwt::config::Config;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt; // for Router::oneshot

type HmacSha256 = Hmac<Sha256>;

const KEY_ID: &str = "6489a1b2c3d4e5f607182930";
const SECRET_HEX: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";

async fn mint_live() -> Value {
    let app = create_router(Arc::new(AppState::new(&Config::default())));
    let body = serde_json::json!({ "apiKey": format!("{KEY_ID}:{SECRET_HEX}") }).to_string();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ghost-jwt")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn decode(seg: &str) -> Value {
    let raw = general_purpose::URL_SAFE_NO_PAD.decode(seg).unwrap();
    serde_json::from_slice(&raw).unwrap()
}

#[tokio::test]
async fn test_live_token_is_verifiable() {
    let json = mint_live().await;
    let jwt = json["jwt"].as_str().unwrap();

    let parts: Vec<&str> = jwt.split('.').collect();
    assert_eq!(parts.len(), 3);
    for part in &parts {
        assert!(!part.contains(['+', '/', '=']), "segment {part}");
    }

    let mut mac = HmacSha256::new_from_slice(&hex::decode(SECRET_HEX).unwrap()).unwrap();
    mac.update(format!("{}.{}", parts[0], parts[1]).as_bytes());
    mac.verify_slice(&general_purpose::URL_SAFE_NO_PAD.decode(parts[2]).unwrap())
        .expect("signature must verify with the hex-decoded secret");
}

#[tokio::test]
async fn test_live_claims_window() {
    let before = chrono::Utc::now().timestamp();
    let json = mint_live().await;
    let after = chrono::Utc::now().timestamp();

    let jwt = json["jwt"].as_str().unwrap();
    let parts: Vec<&str> = jwt.split('.').collect();

    let header = decode(parts[0]);
    assert_eq!(header["alg"], "HS256");
    assert_eq!(header["typ"], "JWT");
    assert_eq!(header["kid"], KEY_ID);

    let claims = decode(parts[1]);
    let iat = claims["iat"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert!(iat >= before && iat <= after);
    assert_eq!(exp - iat, 300);
    assert_eq!(claims["aud"], "/admin/");
    assert_eq!(json["expires_at"].as_i64().unwrap(), exp);
}
