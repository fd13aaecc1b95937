use thiserror::Error;

/// Failure kinds of token issuance. The HTTP layer maps these to status codes.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("API key required")]
    MissingApiKey,

    #[error("API key must be a string")]
    NonStringApiKey,

    #[error("API key must have the form <id>:<secret>")]
    MalformedApiKey,

    #[error("API key secret is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),

    #[error("failed to serialize token segment: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("secret cannot be used as an HMAC key")]
    InvalidKey,
}

impl TokenError {
    /// True when the caller sent nothing usable, as opposed to a key that broke signing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TokenError::MissingApiKey)
    }
}
