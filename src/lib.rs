//! # Casino Realtime Client
//!
//! A Rust client for an online casino's private web API, driven with the
//! session of a logged-in browser.
//!
//! ## Modules
//!
//! - [`auth`]: Session credentials shared by every component
//! - [`api`]: Credential-aware HTTP gateway and account queries
//! - [`websocket`]: Live balances and house bets over `graphql-transport-ws`
//! - [`providers`]: Per-studio betting modules dispatched by provider name
//! - [`webhook`]: Local payment callback server
//! - [`store`]: Invoice and subscription records
//! - [`logging`]: Tracing subscriber setup
//!
//! ## Quick Start - Realtime Events
//!
//! ```rust,ignore
//! use casino_realtime::prelude::*;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(None)?;
//!
//!     let store = CredentialStore::with_credentials(Credentials::from_env().unwrap_or_default());
//!     let gateway = ApiGateway::new(store.clone())?;
//!     println!("{:?}", gateway.get_user_balances().await?);
//!
//!     let mut client = RealtimeClient::new(store, RealtimeConfig::default());
//!     client.start().await?;
//!     while let Some(event) = client.next().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Network URL constants (GraphQL and WebSocket endpoints).
pub mod network;

pub mod auth;

/// HTTP gateway and account queries.
pub mod api;

/// Provider dispatch registry.
pub mod providers;

pub mod store;

pub mod logging;

/// Realtime subscription client.
#[cfg(feature = "websocket")]
pub mod websocket;

/// Payment callback server.
#[cfg(feature = "webhook")]
pub mod webhook;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::{
        ApiError, ApiGateway, ApiResult, Balance, OriginalSlotQueries, Verification,
    };
    pub use crate::auth::{CredentialStore, Credentials};
    pub use crate::logging::{init_logging, LogRecord, LogSink};
    pub use crate::providers::{
        Capability, DispatchContext, ProviderArg, ProviderError, ProviderModule, ProviderRegistry,
    };
    pub use crate::store::{InMemoryStore, SubscriptionStore, SubscriptionType};

    #[cfg(feature = "websocket")]
    pub use crate::websocket::{
        ConnectionState, MultiplierUpdate, RealtimeClient, RealtimeConfig, ReconnectPolicy,
        WebSocketError, WsEvent,
    };

    #[cfg(feature = "webhook")]
    pub use crate::webhook::{start_server, WebhookConfig, WebhookServer, WebhookState};
}
