//! House ("original") games played through direct GraphQL bet mutations.
//!
//! [`OriginalSlotQueries`] maps a lowercased game name to a builder producing
//! the mutation body for a bet of `amount` in `currency` aiming at a target
//! payout multiplier. [`ApiGateway::original_slot_bet`] resolves the name and
//! posts the mutation to the mirror's GraphQL endpoint.

use std::collections::BTreeMap;
use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};

use crate::api::client::ApiGateway;
use crate::api::error::{ApiError, ApiResult};

/// Builds the GraphQL body for `(amount, currency, multiplier_target)`.
pub type SlotQueryBuilder = fn(f64, &str, f64) -> Value;

/// House edge applied by dice: a `x` multiplier wins with `99 / x` percent.
const DICE_RTP_PERCENT: f64 = 99.0;

const BET_IDENTIFIER_LEN: usize = 21;

pub const LIMBO_BET_MUTATION: &str = r#"mutation LimboBet($amount: Float!, $multiplierTarget: Float!, $identifier: String!, $currency: CurrencyEnum!) {
  limboBet(amount: $amount, currency: $currency, multiplierTarget: $multiplierTarget, identifier: $identifier) {
    id
    active
    payoutMultiplier
    amountMultiplier
    amount
    payout
    updatedAt
    currency
    game
    user { id name }
    state {
      ... on CasinoGameLimbo { result multiplierTarget }
    }
  }
}"#;

pub const DICE_ROLL_MUTATION: &str = r#"mutation DiceRoll($amount: Float!, $target: Float!, $condition: CasinoGameDiceConditionEnum!, $currency: CurrencyEnum!, $identifier: String!) {
  diceRoll(amount: $amount, target: $target, condition: $condition, currency: $currency, identifier: $identifier) {
    id
    active
    payoutMultiplier
    amountMultiplier
    amount
    payout
    updatedAt
    currency
    game
    user { id name }
    state {
      ... on CasinoGameDice { result target condition }
    }
  }
}"#;

/// Name-keyed table of bet mutation builders.
#[derive(Clone)]
pub struct OriginalSlotQueries {
    builders: BTreeMap<String, SlotQueryBuilder>,
}

impl fmt::Debug for OriginalSlotQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

impl Default for OriginalSlotQueries {
    fn default() -> Self {
        let mut queries = Self::empty();
        queries.register("limbo", limbo_bet);
        queries.register("dice", dice_roll);
        queries
    }
}

impl OriginalSlotQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table without any game.
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Add or replace the builder for `slot_name` (case-insensitive).
    pub fn register(&mut self, slot_name: &str, builder: SlotQueryBuilder) {
        self.builders.insert(slot_name.to_lowercase(), builder);
    }

    pub fn contains(&self, slot_name: &str) -> bool {
        self.builders.contains_key(&slot_name.to_lowercase())
    }

    /// Registered game names, lowercased.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Build the mutation body for `slot_name`.
    pub fn build(
        &self,
        slot_name: &str,
        amount: f64,
        currency: &str,
        multiplier_target: f64,
    ) -> ApiResult<Value> {
        let builder = self
            .builders
            .get(&slot_name.to_lowercase())
            .ok_or_else(|| ApiError::UnknownSlot(slot_name.to_string()))?;
        Ok(builder(amount, currency, multiplier_target))
    }
}

impl ApiGateway {
    /// Place a bet on a house game through its GraphQL mutation.
    ///
    /// Fails with [`ApiError::UnknownSlot`] before any network activity when
    /// `slot_name` has no registered builder.
    pub async fn original_slot_bet(
        &self,
        queries: &OriginalSlotQueries,
        slot_name: &str,
        amount: f64,
        currency: &str,
        multiplier_target: f64,
    ) -> ApiResult<Value> {
        let query = queries.build(slot_name, amount, currency, multiplier_target)?;
        tracing::debug!(
            slot = slot_name,
            amount,
            currency,
            multiplier_target,
            "Original slot bet"
        );

        self.graphql(&query).await.map_err(|e| {
            tracing::error!(slot = slot_name, error = %e, "Error in original slot bet");
            e
        })
    }
}

/// Limbo: the target multiplier is sent as-is.
pub fn limbo_bet(amount: f64, currency: &str, multiplier_target: f64) -> Value {
    json!({
        "query": LIMBO_BET_MUTATION,
        "variables": {
            "amount": amount,
            "currency": currency,
            "multiplierTarget": multiplier_target,
            "identifier": bet_identifier(),
        }
    })
}

/// Dice: roll above the threshold whose win chance pays `multiplier_target`.
pub fn dice_roll(amount: f64, currency: &str, multiplier_target: f64) -> Value {
    json!({
        "query": DICE_ROLL_MUTATION,
        "variables": {
            "amount": amount,
            "currency": currency,
            "target": dice_target(multiplier_target),
            "condition": "above",
            "identifier": bet_identifier(),
        }
    })
}

/// Roll-over threshold for a payout multiplier, rounded to two decimals.
fn dice_target(multiplier_target: f64) -> f64 {
    let win_chance = (DICE_RTP_PERCENT / multiplier_target.max(1.0102)).clamp(0.01, 98.0);
    ((100.0 - win_chance) * 100.0).round() / 100.0
}

fn bet_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BET_IDENTIFIER_LEN)
        .map(char::from)
        .collect()
}
