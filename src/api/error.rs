//! Error types for the API request gateway.

use thiserror::Error;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API key, user agent or cookie header not yet captured
    #[error("API key, user agent, or cookies are missing")]
    MissingCredentials,

    /// Required request argument absent (URL, query or form params)
    #[error("Missing arguments: {0}")]
    MissingArguments(String),

    /// Response JSON lacks the fields a query expects
    #[error("Unexpected API response structure: {0}")]
    UnexpectedResponseShape(String),

    /// Upstream answered with an error status; body kept for diagnostics
    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    /// Network or TLS failure from reqwest
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// No bet mutation registered for the house game
    #[error("Query not found for slot: {0}")]
    UnknownSlot(String),

    /// Invalid parameter provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// HTTP status of an upstream error response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialize(err.to_string())
    }
}

/// Result type alias for gateway operations.
pub type ApiResult<T> = Result<T, ApiError>;
