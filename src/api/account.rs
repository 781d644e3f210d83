//! Account verification, balances and conversion rates.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::client::ApiGateway;
use crate::api::error::{ApiError, ApiResult};
use crate::api::queries;
use crate::api::types::{
    Balance, CurrencyRate, HouseBetEntry, HouseBetListResponse, UserBalancesResponse,
    Verification,
};
use crate::store::{SubscriptionStore, UserSubscription};

/// Accounts granted access without a paid subscription.
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    "valsalt",
    "mcson",
    "PicsouETH",
    "PepeGambler",
    "Bitcouille",
    "Shevrier",
];

impl ApiGateway {
    /// Recent house bets of the logged-in account.
    pub async fn get_user_house_bets(&self) -> ApiResult<Vec<HouseBetEntry>> {
        let body = self.graphql(&queries::user_house_bets()).await?;
        parse_house_bets(body)
    }

    /// True iff any recent house bet was placed by an account in `allow_list`.
    pub async fn verify_user_allow_list(&self, allow_list: &[&str]) -> ApiResult<bool> {
        let bets = self.get_user_house_bets().await?;
        let verified = bets
            .iter()
            .filter_map(HouseBetEntry::user_name)
            .any(|name| allow_list.contains(&name));
        tracing::info!(verified, "Allow-list verification");
        Ok(verified)
    }

    /// Identify the account from its latest house bet and check its subscription.
    ///
    /// Any failure (network, missing bets, store) yields [`Verification::Unverified`].
    pub async fn verify_user(&self, store: &dyn SubscriptionStore) -> Verification {
        match self.try_verify_user(store).await {
            Ok(verification) => verification,
            Err(e) => {
                tracing::error!(error = %e, "User verification failed");
                Verification::Unverified
            }
        }
    }

    async fn try_verify_user(&self, store: &dyn SubscriptionStore) -> ApiResult<Verification> {
        let bets = self.get_user_house_bets().await?;
        let username = bets
            .first()
            .and_then(HouseBetEntry::user_name)
            .ok_or_else(|| {
                ApiError::UnexpectedResponseShape("no house bet to identify the user".to_string())
            })?
            .to_string();

        let record = store
            .get_user(&username)
            .await
            .map_err(|e| ApiError::InvalidParameter(format!("subscription lookup: {}", e)))?;

        Ok(verification_for(username, record, Utc::now()))
    }

    /// Available balances with a positive amount.
    pub async fn get_user_balances(&self) -> ApiResult<Vec<Balance>> {
        let body = self.graphql(&queries::user_balances()).await?;
        parse_positive_balances(body)
    }

    /// Fiat conversion values of every listed currency.
    pub async fn get_conversion_rates(&self) -> ApiResult<Vec<CurrencyRate>> {
        let body = self.graphql(&queries::conversion_rates()).await?;
        parse_conversion_rates(body)
    }
}

pub(crate) fn verification_for(
    username: String,
    record: Option<UserSubscription>,
    now: DateTime<Utc>,
) -> Verification {
    match record {
        None => Verification::NeedsSubscription { username },
        Some(record) if record.is_active_at(now) => Verification::Valid {
            username,
            until: record.subscription_end,
        },
        Some(record) => Verification::NeedsRenewal {
            username,
            expired_on: record.subscription_end,
        },
    }
}

pub(crate) fn parse_house_bets(body: Value) -> ApiResult<Vec<HouseBetEntry>> {
    let response: HouseBetListResponse = serde_json::from_value(body)?;
    response
        .into_entries()
        .ok_or_else(|| ApiError::UnexpectedResponseShape("data.user.houseBetList".to_string()))
}

pub(crate) fn parse_positive_balances(body: Value) -> ApiResult<Vec<Balance>> {
    let response: UserBalancesResponse = serde_json::from_value(body)?;
    let entries = response
        .data
        .and_then(|d| d.user)
        .and_then(|u| u.balances)
        .ok_or_else(|| ApiError::UnexpectedResponseShape("data.user.balances".to_string()))?;

    Ok(entries
        .into_iter()
        .filter(|entry| entry.available.amount > 0.0)
        .map(|entry| Balance {
            currency: entry.available.currency,
            amount: entry.available.amount,
        })
        .collect())
}

pub(crate) fn parse_conversion_rates(body: Value) -> ApiResult<Vec<CurrencyRate>> {
    match body.pointer("/data/info/currencies") {
        Some(Value::Array(currencies)) => Ok(currencies.clone()),
        _ => Err(ApiError::UnexpectedResponseShape(
            "data.info.currencies".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SubscriptionType;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn subscription(end: DateTime<Utc>) -> UserSubscription {
        UserSubscription {
            username: "alice".to_string(),
            subscription_type: SubscriptionType::OneMonth,
            subscription_start: end - Duration::days(30),
            subscription_end: end,
            amount: "10".to_string(),
            currency: "USDT".to_string(),
            invoice_total_sum: "10".to_string(),
        }
    }

    #[test]
    fn test_balances_keep_only_positive_amounts() {
        let body = json!({
            "data": { "user": { "id": "u1", "balances": [
                { "available": { "amount": 0, "currency": "btc" }, "vault": { "amount": 0, "currency": "btc" } },
                { "available": { "amount": 12.5, "currency": "usdt" }, "vault": { "amount": 1, "currency": "usdt" } }
            ]}}
        });
        let balances = parse_positive_balances(body).unwrap();
        assert_eq!(
            balances,
            vec![Balance {
                currency: "usdt".to_string(),
                amount: 12.5
            }]
        );
    }

    #[test]
    fn test_balances_missing_fields() {
        let result = parse_positive_balances(json!({"data": {"user": null}}));
        assert!(matches!(result, Err(ApiError::UnexpectedResponseShape(_))));
    }

    #[test]
    fn test_conversion_rates_pass_through() {
        let body = json!({"data": {"info": {"currencies": [{"name": "btc", "usd": 60000.0}]}}});
        let rates = parse_conversion_rates(body).unwrap();
        assert_eq!(rates, vec![json!({"name": "btc", "usd": 60000.0})]);

        let result = parse_conversion_rates(json!({"data": {}}));
        assert!(matches!(result, Err(ApiError::UnexpectedResponseShape(_))));
    }

    #[test]
    fn test_house_bets_user_names() {
        let body = json!({
            "data": { "user": { "id": "u1", "houseBetList": [
                { "id": "h1", "iid": "house:1", "bet": { "__typename": "CasinoBet", "id": "b1", "user": { "id": "u1", "name": "mcson" } } },
                { "id": "h2", "iid": "house:2", "bet": { "__typename": "ThirdPartyBet", "id": "b2" } }
            ]}}
        });
        let bets = parse_house_bets(body).unwrap();
        assert_eq!(bets.len(), 2);
        assert_eq!(bets[0].user_name(), Some("mcson"));
        assert_eq!(bets[1].user_name(), None);
        assert!(DEFAULT_ALLOW_LIST.contains(&"mcson"));
    }

    #[test]
    fn test_verification_outcomes() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();

        let future = now + Duration::days(3);
        assert_eq!(
            verification_for("alice".to_string(), Some(subscription(future)), now),
            Verification::Valid {
                username: "alice".to_string(),
                until: future
            }
        );

        let past = now - Duration::days(3);
        assert_eq!(
            verification_for("alice".to_string(), Some(subscription(past)), now),
            Verification::NeedsRenewal {
                username: "alice".to_string(),
                expired_on: past
            }
        );

        assert_eq!(
            verification_for("bob".to_string(), None, now),
            Verification::NeedsSubscription {
                username: "bob".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_verify_user_without_credentials_is_unverified() {
        let gateway = ApiGateway::new(crate::auth::CredentialStore::new()).unwrap();
        let store = crate::store::InMemoryStore::new();
        assert_eq!(gateway.verify_user(&store).await, Verification::Unverified);
    }
}
