//! Network URL constants for the casino API.

/// Default casino mirror host.
pub const DEFAULT_MIRROR: &str = "stake.bet";

/// WebSocket subprotocol spoken by the subscription endpoint.
pub const GRAPHQL_WS_PROTOCOL: &str = "graphql-transport-ws";

/// GraphQL endpoint for a mirror host.
pub fn graphql_url(mirror: &str) -> String {
    format!("https://{}/_api/graphql", mirror)
}

/// Subscription WebSocket endpoint for a mirror host.
pub fn websocket_url(mirror: &str) -> String {
    format!("wss://{}/_api/websockets", mirror)
}
