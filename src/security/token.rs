use base64::{engine::general_purpose, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::TokenError;
use crate::security::api_key::ApiKey;

// base64url(header) "." base64url(claims) "." base64url(HMAC-SHA256(secret, signing input))

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";
pub const TOKEN_TYPE: &str = "JWT";
pub const AUDIENCE: &str = "/admin/";
/// Validity window of a minted token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 300;

/// Source of the issue time. Handlers take it from state so tests can pin it.
pub trait Clock: Send + Sync {
    /// Current Unix time in whole seconds.
    fn now_secs(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

// Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

impl Header {
    pub fn new(kid: &str) -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
            kid: kid.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

impl Claims {
    pub fn issued_at(iat: i64) -> Self {
        Self {
            iat,
            exp: iat + TOKEN_TTL_SECS,
            aud: AUDIENCE.to_string(),
        }
    }
}

/// A minted token and its expiry, in the shape returned to callers.
/// `kid` is kept for logging and never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    #[serde(skip)]
    pub kid: String,
    pub jwt: String,
    pub expires_at: i64,
}

pub fn base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(base64url(&json))
}

/// base64url HMAC-SHA256 of `signing_input` keyed with raw `secret` bytes.
pub fn sign(secret: &[u8], signing_input: &str) -> Result<String, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    Ok(base64url(&mac.finalize().into_bytes()))
}

/// Build the compact token for an already parsed key.
pub fn build_token(key: &ApiKey, iat: i64) -> Result<IssuedToken, TokenError> {
    let header = Header::new(key.id());
    let claims = Claims::issued_at(iat);

    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
    let signature = sign(key.secret(), &signing_input)?;

    Ok(IssuedToken {
        kid: key.id().to_string(),
        jwt: format!("{signing_input}.{signature}"),
        expires_at: claims.exp,
    })
}

/// Parse `api_key` and mint a token issued at `iat`. Pure: same inputs, same token.
pub fn issue_token(api_key: &str, iat: i64) -> Result<IssuedToken, TokenError> {
    if api_key.is_empty() {
        return Err(TokenError::MissingApiKey);
    }
    let key = ApiKey::parse(api_key)?;
    build_token(&key, iat)
}

/// Pretty `{jwt, expires_at}` JSON for one key, issued at the clock's current time.
pub fn mint_json(api_key: &str, clock: &dyn Clock) -> Result<String, TokenError> {
    let issued = issue_token(api_key, clock.now_secs())?;
    Ok(serde_json::to_string_pretty(&issued)?)
}
