//! Fixed GraphQL documents used by the account queries.

use serde_json::{json, Value};

/// Number of recent house bets fetched to identify the account.
pub const HOUSE_BET_LIMIT: u32 = 10;

pub const USER_HOUSE_BETS_QUERY: &str = r#"query UserHouseBets($limit: Int, $offset: Int) {
  user {
    id
    houseBetList(limit: $limit, offset: $offset) {
      id
      iid
      bet {
        __typename
        ... on CasinoBet { id user { id name } }
        ... on EvolutionBet { id user { id name } }
        ... on MultiplayerCrashBet { id user { id name } }
        ... on MultiplayerSlideBet { id user { id name } }
        ... on SoftswissBet { id user { id name } }
        ... on ThirdPartyBet { id user { id name } }
      }
    }
  }
}"#;

pub const USER_BALANCES_QUERY: &str = r#"query UserBalances {
  user {
    id
    balances {
      available {
        amount
        currency
        __typename
      }
      vault {
        amount
        currency
        __typename
      }
      __typename
    }
    __typename
  }
}"#;

pub const CONVERSION_RATES_QUERY: &str = r#"query CurrencyConversionRate {
  info {
    currencies {
      name
      eur: value(fiatCurrency: eur)
      usd: value(fiatCurrency: usd)
      ars: value(fiatCurrency: ars)
      brl: value(fiatCurrency: brl)
      cad: value(fiatCurrency: cad)
      clp: value(fiatCurrency: clp)
      cny: value(fiatCurrency: cny)
      dkk: value(fiatCurrency: dkk)
      idr: value(fiatCurrency: idr)
      inr: value(fiatCurrency: inr)
      krw: value(fiatCurrency: krw)
      mxn: value(fiatCurrency: mxn)
      pen: value(fiatCurrency: pen)
      php: value(fiatCurrency: php)
      pln: value(fiatCurrency: pln)
      rub: value(fiatCurrency: rub)
      try: value(fiatCurrency: try)
      vnd: value(fiatCurrency: vnd)
    }
  }
}"#;

pub fn user_house_bets() -> Value {
    json!({
        "query": USER_HOUSE_BETS_QUERY,
        "operationName": "UserHouseBets",
        "variables": { "limit": HOUSE_BET_LIMIT, "offset": 0 },
    })
}

pub fn user_balances() -> Value {
    json!({
        "query": USER_BALANCES_QUERY,
        "operationName": "UserBalances",
    })
}

pub fn conversion_rates() -> Value {
    json!({
        "query": CONVERSION_RATES_QUERY,
        "operationName": "CurrencyConversionRate",
    })
}
