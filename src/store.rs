//! Invoice and subscription records.
//!
//! Persistent storage lives outside this crate; [`SubscriptionStore`] is the
//! narrow interface the webhook and account verification need, and
//! [`InMemoryStore`] backs tests and single-process setups.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_lock::RwLock;
use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Subscription plans sold through the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
    #[serde(rename = "1_month")]
    OneMonth,
    #[serde(rename = "2_months")]
    TwoMonths,
    #[serde(rename = "3_months")]
    ThreeMonths,
    #[serde(rename = "6_months")]
    SixMonths,
    #[serde(rename = "12_months")]
    TwelveMonths,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1_month",
            Self::TwoMonths => "2_months",
            Self::ThreeMonths => "3_months",
            Self::SixMonths => "6_months",
            Self::TwelveMonths => "12_months",
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::TwoMonths => 2,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
        }
    }

    /// End of a subscription of this type starting at `start`.
    ///
    /// Month arithmetic clamps to the last day of shorter months.
    pub fn end_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.months()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1_month" => Ok(Self::OneMonth),
            "2_months" => Ok(Self::TwoMonths),
            "3_months" => Ok(Self::ThreeMonths),
            "6_months" => Ok(Self::SixMonths),
            "12_months" => Ok(Self::TwelveMonths),
            other => Err(format!("Invalid subscription type: {}", other)),
        }
    }
}

/// A payment gateway invoice awaiting its callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub txn_id: String,
    pub order_number: String,
    pub username: String,
    pub subscription_type: String,
    pub invoice_total_sum: String,
    pub currency: String,
    pub status: String,
}

/// Subscription record of one casino account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub username: String,
    pub subscription_type: SubscriptionType,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub amount: String,
    pub currency: String,
    pub invoice_total_sum: String,
}

impl UserSubscription {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.subscription_end
    }
}

/// Fields written when a payment extends (or creates) a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub username: String,
    pub subscription_type: SubscriptionType,
    pub subscription_end: DateTime<Utc>,
    pub amount: String,
    pub currency: String,
    pub invoice_total_sum: String,
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_user(&self, username: &str) -> StoreResult<Option<UserSubscription>>;

    /// Update an existing user's subscription or add the user, starting now.
    async fn upsert_user_subscription(
        &self,
        update: SubscriptionUpdate,
    ) -> StoreResult<UserSubscription>;

    async fn create_invoice(&self, invoice: Invoice) -> StoreResult<()>;

    async fn get_invoice(&self, order_number: &str) -> StoreResult<Option<Invoice>>;

    async fn update_invoice_status(
        &self,
        order_number: &str,
        status: &str,
        txn_id: Option<&str>,
    ) -> StoreResult<()>;
}

pub type SharedSubscriptionStore = Arc<dyn SubscriptionStore>;

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserSubscription>>,
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record directly.
    pub async fn put_user(&self, user: UserSubscription) {
        self.users.write().await.insert(user.username.clone(), user);
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn get_user(&self, username: &str) -> StoreResult<Option<UserSubscription>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn upsert_user_subscription(
        &self,
        update: SubscriptionUpdate,
    ) -> StoreResult<UserSubscription> {
        let mut users = self.users.write().await;
        let record = match users.get_mut(&update.username) {
            Some(existing) => {
                existing.subscription_type = update.subscription_type;
                existing.subscription_end = update.subscription_end;
                existing.amount = update.amount;
                existing.currency = update.currency;
                existing.invoice_total_sum = update.invoice_total_sum;
                existing.clone()
            }
            None => {
                let created = UserSubscription {
                    username: update.username.clone(),
                    subscription_type: update.subscription_type,
                    subscription_start: Utc::now(),
                    subscription_end: update.subscription_end,
                    amount: update.amount,
                    currency: update.currency,
                    invoice_total_sum: update.invoice_total_sum,
                };
                users.insert(update.username, created.clone());
                created
            }
        };
        Ok(record)
    }

    async fn create_invoice(&self, invoice: Invoice) -> StoreResult<()> {
        self.invoices
            .write()
            .await
            .insert(invoice.order_number.clone(), invoice);
        Ok(())
    }

    async fn get_invoice(&self, order_number: &str) -> StoreResult<Option<Invoice>> {
        Ok(self.invoices.read().await.get(order_number).cloned())
    }

    async fn update_invoice_status(
        &self,
        order_number: &str,
        status: &str,
        txn_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut invoices = self.invoices.write().await;
        match invoices.get_mut(order_number) {
            Some(invoice) => {
                invoice.status = status.to_string();
                if let Some(txn_id) = txn_id {
                    invoice.txn_id = txn_id.to_string();
                }
            }
            None => {
                tracing::debug!(order_number, status, "Status update for unknown invoice");
            }
        }
        Ok(())
    }
}
