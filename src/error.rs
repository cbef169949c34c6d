use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    #[error("JWT encoding error: {0}")]
    JwtEncoding(String),
}

impl TokenError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        TokenError::Configuration(msg.into())
    }

    /// Create a token-invalid error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        TokenError::TokenInvalid(reason.into())
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        TokenError::NotFound(what.into())
    }

    /// True for every rejection of a presented token, and nothing else.
    #[must_use]
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, TokenError::TokenInvalid(_))
    }

    /// Startup failures that must abort the process.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, TokenError::Configuration(_))
    }
}
