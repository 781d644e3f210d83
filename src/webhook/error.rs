//! Error types for the payment webhook.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// `verify_hash` missing or not matching the callback body
    #[error("Invalid callback data")]
    SignatureInvalid,

    #[error("Invalid subscription type: {0}")]
    UnknownSubscriptionType(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebhookError {
    /// Status code the callback handler answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SignatureInvalid => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::SignatureInvalid => {
                tracing::error!("Invalid callback data");
                "Invalid callback data"
            }
            ref other => {
                tracing::error!(error = %other, "Error processing callback");
                "Internal server error"
            }
        };
        (self.status_code(), body).into_response()
    }
}

pub type WebhookResult<T> = Result<T, WebhookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebhookError::SignatureInvalid.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            WebhookError::UnknownSubscriptionType("lifetime".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_signature_error_response() {
        let response = WebhookError::SignatureInvalid.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
