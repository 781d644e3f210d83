//! Error types for provider dispatch.

use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider is not defined")]
    ProviderUndefined,

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Descriptor exists but no module is registered under its key
    #[error("Provider module not found: {0}")]
    ModuleNotFound(String),

    #[error("Method {method} not found in provider {provider}")]
    MethodNotFound { provider: String, method: String },

    /// Gateway failure inside a provider module
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Provider-defined failure, propagated unchanged
    #[error("{0}")]
    Module(String),
}

impl ProviderError {
    pub fn module(message: impl Into<String>) -> Self {
        Self::Module(message.into())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
