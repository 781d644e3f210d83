//! Message types for the `graphql-transport-ws` protocol.
//!
//! This module contains the frames the client sends, the raw inbound frame
//! envelope, and the events delivered to consumers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::websocket::error::WebSocketError;

// ============================================================================
// REQUEST TYPES (Client → Server)
// ============================================================================

/// Outbound protocol frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOut {
    ConnectionInit { payload: InitPayload },
    Subscribe { id: String, payload: SubscribePayload },
    Ping,
}

impl MessageOut {
    pub fn connection_init(payload: InitPayload) -> Self {
        Self::ConnectionInit { payload }
    }

    pub fn subscribe(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Subscribe {
            id: id.into(),
            payload: SubscribePayload {
                query: query.into(),
            },
        }
    }
}

/// `connection_init` payload authenticating the socket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub access_token: String,
    pub language: String,
    pub lockdown_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscribePayload {
    pub query: String,
}

// ============================================================================
// RESPONSE TYPES (Server → Client)
// ============================================================================

/// Raw frame envelope for initial parsing
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// A live bet result from the `HouseBets` subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplierUpdate {
    pub multiplier: f64,
    pub payout: f64,
    pub currency: String,
    pub amount: f64,
    pub slot_name: String,
    pub iid: String,
}

/// `payload.data.houseBets` of a `next` frame
///
/// Every field tolerates `null` or absence so a partial bet still yields an update.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HouseBetFrame {
    #[serde(default, deserialize_with = "lenient_string")]
    pub iid: String,
    #[serde(default)]
    pub game: Option<GameInfo>,
    #[serde(default)]
    pub bet: Option<HouseBetDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GameInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HouseBetDetails {
    #[serde(default)]
    pub payout_multiplier: Option<f64>,
    #[serde(default)]
    pub payout: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Strings as-is, numbers and booleans as their JSON text, `null` as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

impl From<HouseBetFrame> for MultiplierUpdate {
    fn from(frame: HouseBetFrame) -> Self {
        let bet = frame.bet.unwrap_or_default();
        Self {
            multiplier: bet.payout_multiplier.unwrap_or_default(),
            payout: bet.payout.unwrap_or_default(),
            currency: bet.currency,
            amount: bet.amount.unwrap_or_default(),
            slot_name: frame.game.map(|g| g.name).unwrap_or_default(),
            iid: frame.iid,
        }
    }
}

// ============================================================================
// CLIENT EVENTS
// ============================================================================

/// Events emitted by the realtime client
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Socket opened, `connection_init` sent
    Connected,

    /// `connection_ack` received and subscriptions registered
    Acknowledged,

    /// Raw `availableBalances` payload
    BalanceUpdate(Value),

    /// House bet result
    MultiplierUpdate(MultiplierUpdate),

    /// Error occurred; the connection is kept
    Error { error: WebSocketError },

    /// Connection lost
    Disconnected { code: u16, reason: String },

    /// Reconnect scheduled after `delay`
    Reconnecting { attempt: u32, delay: Duration },

    /// Reconnect attempts exhausted; the task has stopped
    MaxReconnectReached,

    /// The task has stopped (by request or for lack of credentials)
    Stopped,
}

// ============================================================================
// CONNECTION STATE
// ============================================================================

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Handshaking = 2,
    Active = 3,
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Handshaking,
            3 => Self::Active,
            _ => Self::Disconnected,
        }
    }
}
