//! Error types for auth module.

use std::error::Error as StdError;

/// Errors reported by the session store and its storage backends.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session exists to return or refresh.
    #[error("No session found")]
    NoSession,

    /// The supplied tokens were rejected.
    #[error("Invalid tokens: {0}")]
    InvalidTokens(String),

    /// The auth service answered with an error payload.
    #[error("Auth API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A PKCE code arrived but no verifier was stored for it.
    #[error("No PKCE code verifier stored")]
    MissingCodeVerifier,

    /// Session storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl From<Box<dyn StdError + Send + Sync>> for AuthError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        AuthError::Other(err.to_string())
    }
}
