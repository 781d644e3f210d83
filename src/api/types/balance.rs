//! Balance and currency types for account queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A spendable balance in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub amount: f64,
}

/// `{ amount, currency }` node of the `UserBalances` query.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceAmount {
    pub amount: f64,
    pub currency: String,
}

/// One `balances[]` entry of the `UserBalances` query.
#[derive(Debug, Clone, Deserialize)]
pub struct UserBalanceEntry {
    pub available: BalanceAmount,
    #[serde(default)]
    pub vault: Option<BalanceAmount>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserBalancesUser {
    pub balances: Option<Vec<UserBalanceEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserBalancesData {
    pub user: Option<UserBalancesUser>,
}

/// Envelope of the `UserBalances` query response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserBalancesResponse {
    pub data: Option<UserBalancesData>,
}

/// Fiat conversion values of one crypto currency, keyed by fiat code.
///
/// Kept as raw JSON: the server returns `name` plus one field per requested fiat.
pub type CurrencyRate = Value;
