//! Local HTTP server receiving Plisio payment callbacks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::store::{SharedSubscriptionStore, SubscriptionType, SubscriptionUpdate};
use crate::webhook::error::{WebhookError, WebhookResult};
use crate::webhook::signature::verify_callback_data;

/// Environment variable holding the payment gateway secret key.
pub const ENV_SECRET_KEY: &str = "PLISIO_SECRET_KEY";

pub const CALLBACK_PATH: &str = "/plisio-callback";

/// Webhook server configuration
#[derive(Clone)]
pub struct WebhookConfig {
    /// Shared HMAC secret
    pub secret: String,
    pub host: IpAddr,
    /// Candidate ports, tried in order. Default: 3000-3005
    pub ports: Vec<u16>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"<redacted>")
            .field("host", &self.host)
            .field("ports", &self.ports)
            .finish()
    }
}

impl WebhookConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ports: (3000..=3005).collect(),
        }
    }

    /// Read the secret from `PLISIO_SECRET_KEY`.
    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_SECRET_KEY)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }
}

/// Notification sent to the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    Completed { order_number: String },
}

/// Shared handler state
#[derive(Clone)]
pub struct WebhookState {
    secret: Arc<str>,
    store: SharedSubscriptionStore,
    notifier: Option<mpsc::Sender<PaymentEvent>>,
}

impl WebhookState {
    pub fn new(secret: &str, store: SharedSubscriptionStore) -> Self {
        Self {
            secret: Arc::from(secret),
            store,
            notifier: None,
        }
    }

    /// Forward completed payments to `notifier`.
    pub fn with_notifier(mut self, notifier: mpsc::Sender<PaymentEvent>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn notify(&self, event: PaymentEvent) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.try_send(event) {
            tracing::warn!("Failed to deliver payment event: {}", e);
        }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route(CALLBACK_PATH, post(plisio_callback))
        .with_state(state)
}

async fn plisio_callback(State(state): State<WebhookState>, body: Bytes) -> Response {
    match handle_callback(&state, &body).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_callback(
    state: &WebhookState,
    body: &[u8],
) -> WebhookResult<(StatusCode, String)> {
    let data: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    tracing::info!(body = %data, "Received Plisio callback");

    if !verify_callback_data(state.secret.as_bytes(), &data) {
        return Err(WebhookError::SignatureInvalid);
    }
    process_callback(state, &data).await
}

async fn process_callback(
    state: &WebhookState,
    data: &Value,
) -> WebhookResult<(StatusCode, String)> {
    let order_number = field_text(data, "order_number");
    let status = field_text(data, "status");
    let txn_id = field_text(data, "txn_id");

    state
        .store
        .update_invoice_status(
            &order_number,
            &status,
            Some(txn_id.as_str()).filter(|t| !t.is_empty()),
        )
        .await?;

    if status != "completed" {
        return Ok((StatusCode::OK, format!("Payment status: {}", status)));
    }

    let Some(invoice) = state.store.get_invoice(&order_number).await? else {
        tracing::warn!(order_number = %order_number, "Invoice not found");
        return Ok((StatusCode::NOT_FOUND, "Invoice not found".to_string()));
    };

    tracing::info!(order_number = %order_number, "Payment completed");
    state.notify(PaymentEvent::Completed {
        order_number: order_number.clone(),
    });

    let subscription_type: SubscriptionType = invoice
        .subscription_type
        .parse()
        .map_err(|_| WebhookError::UnknownSubscriptionType(invoice.subscription_type.clone()))?;

    let updated = state
        .store
        .upsert_user_subscription(SubscriptionUpdate {
            username: invoice.username,
            subscription_type,
            subscription_end: subscription_type.end_from(Utc::now()),
            amount: field_text(data, "amount"),
            currency: field_text(data, "currency"),
            invoice_total_sum: field_text(data, "invoice_total_sum"),
        })
        .await?;

    tracing::info!(
        username = %updated.username,
        until = %updated.subscription_end,
        "Subscription updated"
    );
    Ok((StatusCode::OK, "OK".to_string()))
}

/// String fields verbatim, other scalars as JSON text, missing as empty.
fn field_text(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Running webhook server
pub struct WebhookServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl WebhookServer {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> WebhookResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(result) => result.map_err(WebhookError::from),
            Err(e) => Err(WebhookError::Io(std::io::Error::other(e))),
        }
    }
}

/// Bind the first free candidate port and serve in the background.
pub async fn start_server(
    config: &WebhookConfig,
    state: WebhookState,
) -> WebhookResult<WebhookServer> {
    let listener = bind_first_free(config.host, &config.ports).await?;
    let port = listener.local_addr()?.port();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tracing::info!(port, "Webhook server listening");
    Ok(WebhookServer {
        port,
        shutdown: Some(shutdown_tx),
        handle,
    })
}

async fn bind_first_free(host: IpAddr, ports: &[u16]) -> WebhookResult<TcpListener> {
    let mut last_error = None;
    for port in ports {
        match TcpListener::bind(SocketAddr::new(host, *port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!(port, error = %e, "Port unavailable");
                last_error = Some(e);
            }
        }
    }
    let error = last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "no ports configured")
    });
    Err(error.into())
}
