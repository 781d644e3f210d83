//! Casino web API module.
//!
//! This module provides the credential-aware HTTP gateway and the account
//! queries built on it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use casino_realtime::api::ApiGateway;
//! use casino_realtime::auth::{CredentialStore, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CredentialStore::with_credentials(Credentials::from_env().unwrap_or_default());
//!     let gateway = ApiGateway::new(store)?;
//!
//!     for balance in gateway.get_user_balances().await? {
//!         println!("{} {}", balance.amount, balance.currency);
//!     }
//!
//!     let rates = gateway.get_conversion_rates().await?;
//!     println!("{} currencies", rates.len());
//!     Ok(())
//! }
//! ```
//!
//! # Gateway Configuration
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! let gateway = ApiGateway::builder(store)
//!     .mirror("stake.bet")
//!     .timeout(Duration::from_secs(60))
//!     .header("Accept-Language", "fr-FR")
//!     .build()?;
//! ```
//!
//! # Error Handling
//!
//! All methods return `ApiResult<T>`, an alias for `Result<T, ApiError>`:
//!
//! ```rust,ignore
//! match gateway.get_user_balances().await {
//!     Ok(balances) => println!("{} balances", balances.len()),
//!     Err(ApiError::MissingCredentials) => println!("Log in first"),
//!     Err(ApiError::Http { status, .. }) => println!("Upstream returned {}", status),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

pub mod account;
pub mod client;
pub mod error;
pub mod originals;
pub mod queries;
pub mod types;

// Re-export main types for convenience
pub use account::DEFAULT_ALLOW_LIST;
pub use client::{ApiGateway, ApiGatewayBuilder, HttpResponse};
pub use error::{ApiError, ApiResult};
pub use originals::{OriginalSlotQueries, SlotQueryBuilder};
pub use types::*;
