//! Payment gateway webhook.
//!
//! Serves `POST /plisio-callback` on localhost. Verified callbacks update the
//! invoice status; a `completed` payment extends the buyer's subscription.
//!
//! ```rust,ignore
//! let store: SharedSubscriptionStore = Arc::new(InMemoryStore::new());
//! let config = WebhookConfig::from_env().expect("PLISIO_SECRET_KEY");
//! let server = start_server(&config, WebhookState::new(&config.secret, store)).await?;
//! println!("Listening on {}", server.port());
//! ```

pub mod error;
pub mod server;
pub mod signature;

pub use error::{WebhookError, WebhookResult};
pub use server::{
    router, start_server, PaymentEvent, WebhookConfig, WebhookServer, WebhookState, CALLBACK_PATH,
};
pub use signature::{sign_callback_data, verify_callback_data};
