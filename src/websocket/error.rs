//! WebSocket-specific error types for the realtime client.

use thiserror::Error;

/// WebSocket-specific errors
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    /// API key, user agent or cookie header not yet captured
    #[error("Cannot start realtime client: API key, user agent, or cookies are missing")]
    MissingCredentials,

    /// Socket could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connect attempt exceeded the connect timeout
    #[error("Operation timed out")]
    Timeout,

    /// WebSocket protocol error
    #[error("WebSocket protocol error: {0}")]
    Protocol(String),

    /// Invalid URL
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// JSON deserialization failure
    #[error("Failed to parse message: {0}")]
    MessageParseError(String),

    /// `error` frame sent by the server
    #[error("Server error: {0}")]
    ServerError(String),

    /// Not connected
    #[error("Not connected to WebSocket server")]
    NotConnected,

    /// Send failed
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// TLS connector could not be built
    #[error("TLS error: {0}")]
    Tls(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for WebSocketError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::ConnectionClosed | Error::AlreadyClosed => WebSocketError::NotConnected,
            Error::Io(e) => WebSocketError::ConnectionFailed(e.to_string()),
            Error::Tls(e) => WebSocketError::Tls(e.to_string()),
            Error::Protocol(e) => WebSocketError::Protocol(e.to_string()),
            Error::Url(e) => WebSocketError::InvalidUrl(e.to_string()),
            Error::Http(resp) => {
                WebSocketError::ConnectionFailed(format!("HTTP error: {:?}", resp.status()))
            }
            Error::HttpFormat(e) => WebSocketError::ConnectionFailed(e.to_string()),
            other => WebSocketError::Protocol(other.to_string()),
        }
    }
}

impl From<native_tls::Error> for WebSocketError {
    fn from(err: native_tls::Error) -> Self {
        WebSocketError::Tls(err.to_string())
    }
}

impl From<serde_json::Error> for WebSocketError {
    fn from(err: serde_json::Error) -> Self {
        WebSocketError::MessageParseError(err.to_string())
    }
}

/// Result type alias for WebSocket operations
pub type WsResult<T> = Result<T, WebSocketError>;
