//! Integration tests for the realtime client against a local
//! `graphql-transport-ws` server.
//!
//! The live test is ignored by default.
//! Run with: `cargo test --test realtime_integration -- --ignored`

#![cfg(feature = "websocket")]

use std::time::{Duration, Instant};

use casino_realtime::auth::{CredentialStore, Credentials};
use casino_realtime::websocket::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

type ServerSocket = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

struct Accepted {
    headers: HeaderMap,
    socket: ServerSocket,
    at: Instant,
}

/// Accept connections on an ephemeral port, echoing the subprotocol.
async fn mock_server() -> (String, mpsc::UnboundedReceiver<Accepted>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let mut headers = HeaderMap::new();
            let callback = |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
                headers = req.headers().clone();
                resp.headers_mut().insert(
                    SEC_WEBSOCKET_PROTOCOL,
                    HeaderValue::from_static("graphql-transport-ws"),
                );
                Ok(resp)
            };
            if let Ok(socket) = accept_hdr_async(stream, callback).await {
                let _ = tx.send(Accepted {
                    headers,
                    socket,
                    at: Instant::now(),
                });
            }
        }
    });

    (url, rx)
}

fn credentials() -> CredentialStore {
    CredentialStore::with_credentials(Credentials::new(
        "TestAgent/1.0",
        "session=abc; cf_clearance=xyz",
        "api-key-1",
    ))
}

fn config(url: &str) -> RealtimeConfig {
    RealtimeConfig {
        url: url.to_string(),
        ping_interval: Duration::from_millis(300),
        ..RealtimeConfig::default()
    }
}

async fn accept(rx: &mut mpsc::UnboundedReceiver<Accepted>) -> Accepted {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for connection")
        .expect("server stopped")
}

/// Next text frame received by the server, as JSON.
async fn next_frame(socket: &mut ServerSocket) -> Value {
    loop {
        let msg = timeout(WAIT, socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Close(frame) => panic!("unexpected close: {:?}", frame),
            _ => continue,
        }
    }
}

async fn send_json(socket: &mut ServerSocket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

async fn next_event(client: &mut RealtimeClient) -> WsEvent {
    timeout(WAIT, client.next())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

/// Run the handshake on the server side; returns the two subscription ids.
async fn complete_handshake(socket: &mut ServerSocket) -> (String, String) {
    let init = next_frame(socket).await;
    assert_eq!(init["type"], "connection_init");
    send_json(socket, json!({"type": "connection_ack"})).await;

    let first = next_frame(socket).await;
    let second = next_frame(socket).await;
    assert_eq!(first["type"], "subscribe");
    assert_eq!(second["type"], "subscribe");
    (
        first["id"].as_str().unwrap().to_string(),
        second["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_handshake_sends_frames_in_order() {
    let (url, mut server) = mock_server().await;
    let mut client = RealtimeClient::new(credentials(), config(&url));
    client.start().await.unwrap();

    let Accepted {
        headers,
        mut socket,
        ..
    } = accept(&mut server).await;
    assert_eq!(headers["user-agent"], "TestAgent/1.0");
    assert_eq!(headers["cookie"], "session=abc; cf_clearance=xyz");
    assert_eq!(headers["sec-websocket-protocol"], "graphql-transport-ws");

    let init = next_frame(&mut socket).await;
    assert_eq!(init["type"], "connection_init");
    assert_eq!(init["payload"]["accessToken"], "api-key-1");
    assert_eq!(init["payload"]["language"], "fr");
    let token = init["payload"]["lockdownToken"].as_str().unwrap();
    assert_eq!(token.len(), 20);
    assert!(token.chars().all(|c| c.is_ascii_digit()));

    // No keep-alive before the ack, even after several ping intervals
    assert!(timeout(Duration::from_millis(800), socket.next()).await.is_err());
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert_eq!(client.connection_state(), ConnectionState::Handshaking);

    send_json(&mut socket, json!({"type": "connection_ack"})).await;

    let first = next_frame(&mut socket).await;
    let second = next_frame(&mut socket).await;
    assert_eq!(first["type"], "subscribe");
    assert_eq!(second["type"], "subscribe");
    assert_ne!(first["id"], second["id"]);
    assert!(first["payload"]["query"]
        .as_str()
        .unwrap()
        .starts_with("subscription HouseBets"));
    assert!(second["payload"]["query"]
        .as_str()
        .unwrap()
        .starts_with("subscription AvailableBalances"));

    let acked_at = Instant::now();
    let ping = next_frame(&mut socket).await;
    assert_eq!(ping, json!({"type": "ping"}));
    assert!(acked_at.elapsed() >= Duration::from_millis(200));

    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));
    assert!(client.is_active());
    assert_eq!(client.active_subscription_count(), 2);

    client.stop().await.unwrap();
    assert!(matches!(next_event(&mut client).await, WsEvent::Stopped));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert!(!client.is_running());
}

#[tokio::test]
async fn test_next_frames_become_events() {
    let (url, mut server) = mock_server().await;
    let mut client = RealtimeClient::new(credentials(), config(&url));
    client.start().await.unwrap();

    let mut socket = accept(&mut server).await.socket;
    let (house_bets_id, balances_id) = complete_handshake(&mut socket).await;
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));

    send_json(
        &mut socket,
        json!({
            "id": house_bets_id,
            "type": "next",
            "payload": {"data": {"houseBets": {
                "id": "h1",
                "iid": "house:77",
                "game": {"name": "Sweet Bonanza", "icon": "sb"},
                "bet": {
                    "__typename": "ThirdPartyBet",
                    "payoutMultiplier": 1000,
                    "payout": 200,
                    "currency": "usdt",
                    "amount": 0.2,
                    "user": {"id": "u1", "name": "someone"}
                }
            }}}
        }),
    )
    .await;

    send_json(
        &mut socket,
        json!({
            "id": balances_id,
            "type": "next",
            "payload": {"data": {"availableBalances": {
                "amount": 12.5,
                "identifier": "i1",
                "balance": {"amount": 12.5, "currency": "usdt"}
            }}}
        }),
    )
    .await;

    match next_event(&mut client).await {
        WsEvent::MultiplierUpdate(update) => {
            assert_eq!(update.multiplier, 1000.0);
            assert_eq!(update.payout, 200.0);
            assert_eq!(update.currency, "usdt");
            assert_eq!(update.amount, 0.2);
            assert_eq!(update.slot_name, "Sweet Bonanza");
            assert_eq!(update.iid, "house:77");
        }
        other => panic!("Expected MultiplierUpdate, got {:?}", other),
    }

    match next_event(&mut client).await {
        WsEvent::BalanceUpdate(payload) => {
            assert_eq!(payload["balance"], json!({"amount": 12.5, "currency": "usdt"}));
        }
        other => panic!("Expected BalanceUpdate, got {:?}", other),
    }

    client.stop().await.unwrap();
}

#[tokio::test]
async fn test_error_and_garbage_frames_keep_connection() {
    let (url, mut server) = mock_server().await;
    let mut client = RealtimeClient::new(credentials(), config(&url));
    client.start().await.unwrap();

    let mut socket = accept(&mut server).await.socket;
    complete_handshake(&mut socket).await;
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));

    socket
        .send(Message::Text("definitely not json".into()))
        .await
        .unwrap();
    send_json(
        &mut socket,
        json!({"type": "error", "id": "x", "payload": [{"message": "Forbidden"}]}),
    )
    .await;
    send_json(&mut socket, json!({"type": "pong"})).await;
    send_json(
        &mut socket,
        json!({"type": "next", "payload": {"data": {"availableBalances": {"amount": 1}}}}),
    )
    .await;

    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::Error {
            error: WebSocketError::MessageParseError(_)
        }
    ));
    match next_event(&mut client).await {
        WsEvent::Error {
            error: WebSocketError::ServerError(message),
        } => assert!(message.contains("Forbidden")),
        other => panic!("Expected server error, got {:?}", other),
    }
    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::BalanceUpdate(_)
    ));
    assert!(client.is_active());

    client.stop().await.unwrap();
}

#[tokio::test]
async fn test_reconnects_once_after_close() {
    let (url, mut server) = mock_server().await;
    let mut client = RealtimeClient::new(credentials(), config(&url));
    client.start().await.unwrap();

    let mut first = accept(&mut server).await.socket;
    let (first_ids_a, first_ids_b) = complete_handshake(&mut first).await;
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));

    let closed_at = Instant::now();
    first
        .close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "server restart".into(),
        }))
        .await
        .unwrap();

    match next_event(&mut client).await {
        WsEvent::Disconnected { code, reason } => {
            assert_eq!(code, 1001);
            assert_eq!(reason, "server restart");
        }
        other => panic!("Expected Disconnected, got {:?}", other),
    }
    match next_event(&mut client).await {
        WsEvent::Reconnecting { attempt, delay } => {
            assert_eq!(attempt, 1);
            assert_eq!(delay, Duration::from_secs(1));
        }
        other => panic!("Expected Reconnecting, got {:?}", other),
    }

    let second = accept(&mut server).await;
    let waited = second.at.duration_since(closed_at);
    assert!(waited >= Duration::from_millis(900), "reconnected after {:?}", waited);
    assert!(waited < Duration::from_millis(2500), "reconnected after {:?}", waited);

    // Fresh handshake with fresh subscription ids
    let mut socket = second.socket;
    let (second_ids_a, second_ids_b) = complete_handshake(&mut socket).await;
    for id in [&second_ids_a, &second_ids_b] {
        assert_ne!(id, &first_ids_a);
        assert_ne!(id, &first_ids_b);
    }
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));
    assert_eq!(client.active_subscription_count(), 2);

    // Only one connection was opened for the single close
    assert!(timeout(Duration::from_millis(300), server.recv()).await.is_err());

    // The attempt counter restarts after a healthy connection
    socket.close(None).await.unwrap();
    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::Disconnected { .. }
    ));
    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::Reconnecting { attempt: 1, .. }
    ));

    client.stop().await.unwrap();
    assert!(matches!(next_event(&mut client).await, WsEvent::Stopped));
}

#[tokio::test]
async fn test_stops_when_credentials_cleared_before_reconnect() {
    let (url, mut server) = mock_server().await;
    let store = credentials();
    let mut client = RealtimeClient::new(store.clone(), config(&url));
    client.start().await.unwrap();

    let mut socket = accept(&mut server).await.socket;
    complete_handshake(&mut socket).await;
    assert!(matches!(next_event(&mut client).await, WsEvent::Connected));
    assert!(matches!(next_event(&mut client).await, WsEvent::Acknowledged));

    socket.close(None).await.unwrap();
    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::Disconnected { .. }
    ));
    store.clear().await;

    assert!(matches!(
        next_event(&mut client).await,
        WsEvent::Reconnecting { .. }
    ));
    assert!(matches!(next_event(&mut client).await, WsEvent::Stopped));
    assert!(timeout(Duration::from_millis(300), server.recv()).await.is_err());
}

#[tokio::test]
async fn test_max_reconnect_reached() {
    // Nothing listens on this port once the listener is dropped
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = RealtimeConfig {
        reconnect: ReconnectPolicy::fixed(Duration::from_millis(50)).with_max_attempts(2),
        ..config(&url)
    };
    let mut client = RealtimeClient::new(credentials(), config);
    client.start().await.unwrap();

    let mut reconnecting = 0;
    loop {
        match next_event(&mut client).await {
            WsEvent::Reconnecting { .. } => reconnecting += 1,
            WsEvent::MaxReconnectReached => break,
            WsEvent::Error { .. } | WsEvent::Disconnected { .. } => {}
            other => panic!("Unexpected event {:?}", other),
        }
    }
    assert_eq!(reconnecting, 2);
}

#[tokio::test]
async fn test_stop_interrupts_pending_upgrade() {
    // Accepts TCP but never answers the upgrade request
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = RealtimeConfig {
        connect_timeout: Duration::from_secs(30),
        ..config(&url)
    };
    let mut client = RealtimeClient::new(credentials(), config);
    client.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(client.connection_state(), ConnectionState::Connecting);

    let started = Instant::now();
    timeout(Duration::from_secs(2), client.stop())
        .await
        .expect("stop blocked on the pending connect")
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    assert!(matches!(next_event(&mut client).await, WsEvent::Stopped));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert!(!client.is_running());
}

#[tokio::test]
async fn test_start_requires_credentials() {
    let mut client = RealtimeClient::new(
        CredentialStore::with_credentials(Credentials::new("ua", "a=b", "")),
        RealtimeConfig::default(),
    );
    assert!(matches!(
        client.start().await,
        Err(WebSocketError::MissingCredentials)
    ));
}

/// Live session smoke test
#[tokio::test]
#[ignore = "requires CASINO_USER_AGENT, CASINO_COOKIES and CASINO_API_KEY"]
async fn test_live_acknowledged() {
    let credentials = Credentials::from_env().expect("credentials in environment");
    let mut client = RealtimeClient::new(
        CredentialStore::with_credentials(credentials),
        RealtimeConfig::default(),
    );
    client.start().await.unwrap();

    let acknowledged = timeout(Duration::from_secs(30), async {
        while let Some(event) = client.next().await {
            if matches!(event, WsEvent::Acknowledged) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    assert!(acknowledged);
    client.stop().await.unwrap();
}
