//! Realtime WebSocket client module.
//!
//! This module streams live balance changes and house bet results over the
//! casino's `graphql-transport-ws` endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use casino_realtime::auth::CredentialStore;
//! use casino_realtime::websocket::{RealtimeClient, RealtimeConfig, WsEvent};
//! use futures_util::StreamExt;
//!
//! let mut client = RealtimeClient::new(store, RealtimeConfig::for_mirror("stake.bet"));
//! client.start().await?;
//!
//! while let Some(event) = client.next().await {
//!     if let WsEvent::MultiplierUpdate(update) = event {
//!         println!("{} paid x{}", update.slot_name, update.multiplier);
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod handlers;
pub mod subscriptions;
pub mod types;

pub use client::{RealtimeClient, RealtimeConfig, ReconnectPolicy};
pub use error::{WebSocketError, WsResult};
pub use handlers::{decode_frame, InboundFrame};
pub use subscriptions::{Subscription, SubscriptionManager};
pub use types::{ConnectionState, InitPayload, MessageOut, MultiplierUpdate, WsEvent};
