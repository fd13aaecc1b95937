use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::{Config, HEALTH_ROUTE};
use crate::error::TokenError;
use crate::security::api_key::TokenRequest;
use crate::security::audit_log::AuditLogger;
use crate::security::token::{issue_token, Clock, SystemClock};

type SharedState = Arc<AppState>;

pub const METHOD_NOT_ALLOWED_MSG: &str = "Method not allowed";
pub const API_KEY_REQUIRED_MSG: &str = "API key required";
pub const GENERATION_FAILED_MSG: &str = "Failed to generate JWT";

pub struct AppState {
    pub route: String,
    pub clock: Arc<dyn Clock>,
    pub audit: AuditLogger,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: &Config, clock: impl Clock + 'static) -> Self {
        Self {
            route: config.route.clone(),
            clock: Arc::new(clock),
            audit: AuditLogger::new(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_body(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

// Only the missing-key case is the caller's fault; everything else is opaque.
fn token_error_response(err: &TokenError) -> Response {
    if err.is_client_error() {
        error_body(StatusCode::BAD_REQUEST, API_KEY_REQUIRED_MSG)
    } else {
        error_body(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED_MSG)
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn token_handler(
    State(state): State<SharedState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::POST {
        state.audit.method_not_allowed(method.as_str());
        return error_body(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MSG);
    }

    let request = TokenRequest::from_body(&body);
    let result = request
        .api_key()
        .and_then(|key| issue_token(key, state.clock.now_secs()));
    match result {
        Ok(issued) => {
            state.audit.token_issued(&issued.kid, issued.expires_at);
            (StatusCode::OK, Json(issued)).into_response()
        }
        Err(e) if e.is_client_error() => {
            state.audit.issuance_rejected(&e.to_string());
            token_error_response(&e)
        }
        Err(e) => {
            state.audit.issuance_failed(request.key_id(), &e.to_string());
            token_error_response(&e)
        }
    }
}

/// Panics if `state.route` is not a path axum accepts; [`serve`] checks it
/// with [`Config::validate`] first.
pub fn create_router(state: SharedState) -> Router {
    let token_routes = Router::new()
        .route(&state.route, any(token_handler))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ));

    debug!("token endpoint mounted at {}", state.route);

    Router::new()
        .route(HEALTH_ROUTE, get(health))
        .merge(token_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub async fn serve(config: Config) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let state = Arc::new(AppState::new(&config));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("HTTP server listening on {} (token route {})", addr, config.route);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
