use std::fmt;

use serde_json::Value;
use zeroize::Zeroizing;

use crate::error::TokenError;

/// Body of a token request: the raw `apiKey` member when the body is a JSON
/// object that has one. Its type is checked by [`TokenRequest::api_key`].
#[derive(Debug, Default)]
pub struct TokenRequest {
    pub api_key: Option<Value>,
}

impl TokenRequest {
    /// Lenient body parsing: an empty body, invalid JSON or a non-object
    /// yields a request without a key.
    pub fn from_body(body: &[u8]) -> Self {
        let api_key = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| match v {
                Value::Object(mut map) => map.remove("apiKey"),
                _ => None,
            });
        Self { api_key }
    }

    /// The key as a non-empty string. Falsy values (absent, `null`, `""`,
    /// `false`, `0`) are a missing key; any other non-string is rejected.
    pub fn api_key(&self) -> Result<&str, TokenError> {
        match &self.api_key {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.as_str()),
            None | Some(Value::Null) | Some(Value::Bool(false)) | Some(Value::String(_)) => {
                Err(TokenError::MissingApiKey)
            }
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(TokenError::MissingApiKey),
            Some(_) => Err(TokenError::NonStringApiKey),
        }
    }

    /// The id half of a string key, for logging only.
    pub fn key_id(&self) -> Option<&str> {
        match &self.api_key {
            Some(Value::String(key)) => key.split_once(':').map(|(id, _)| id),
            _ => None,
        }
    }
}

/// A parsed `<id>:<secret>` admin key with the secret hex-decoded.
pub struct ApiKey {
    id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl ApiKey {
    /// Split on the first `:` and decode the secret. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let (id, secret_hex) = raw.split_once(':').ok_or(TokenError::MalformedApiKey)?;
        if id.is_empty() || secret_hex.is_empty() {
            return Err(TokenError::MalformedApiKey);
        }
        let secret = Zeroizing::new(hex::decode(secret_hex)?);
        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
