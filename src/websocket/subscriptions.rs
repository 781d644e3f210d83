//! Subscription registry for one connection.
//!
//! Each connection registers the `HouseBets` and `AvailableBalances`
//! subscriptions under fresh correlation ids. A new manager is created per
//! connection, so ids are never reused across reconnects.

use std::collections::HashMap;

use uuid::Uuid;

use crate::websocket::types::MessageOut;

pub const HOUSE_BETS_SUBSCRIPTION: &str = r#"subscription HouseBets {
  houseBets {
    ...RealtimeHouseBet
    __typename
  }
}

fragment RealtimeHouseBet on Bet {
  id
  iid
  game {
    name
    icon
    __typename
  }
  bet {
    __typename
    ... on CasinoBet {
      id
      active
      payoutMultiplier
      amountMultiplier
      amount
      payout
      updatedAt
      currency
      user {
        id
        name
        __typename
      }
      __typename
    }
    ... on EvolutionBet {
      id
      amount
      currency
      createdAt
      payout
      payoutMultiplier
      user {
        id
        name
        __typename
      }
      __typename
    }
    ... on MultiplayerCrashBet {
      id
      payoutMultiplier
      amount
      payout
      currency
      updatedAt
      user {
        id
        name
        __typename
      }
      __typename
    }
    ... on MultiplayerSlideBet {
      id
      payoutMultiplier
      amount
      payout
      currency
      updatedAt
      createdAt
      user {
        id
        name
        __typename
      }
      __typename
    }
    ... on SoftswissBet {
      id
      amount
      currency
      updatedAt
      payout
      payoutMultiplier
      user {
        id
        name
        __typename
      }
      __typename
    }
    ... on ThirdPartyBet {
      id
      amount
      currency
      updatedAt
      createdAt
      payout
      payoutMultiplier
      user {
        id
        name
        __typename
      }
      __typename
    }
  }
}
"#;

pub const AVAILABLE_BALANCES_SUBSCRIPTION: &str = r#"subscription AvailableBalances {
  availableBalances {
    amount
    identifier
    balance {
      amount
      currency
    }
  }
}
"#;

/// Server-side stream a subscription id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    HouseBets,
    AvailableBalances,
}

impl Subscription {
    /// Every subscription registered after `connection_ack`, in send order.
    pub const ALL: [Subscription; 2] = [Subscription::HouseBets, Subscription::AvailableBalances];

    pub fn query(&self) -> &'static str {
        match self {
            Self::HouseBets => HOUSE_BETS_SUBSCRIPTION,
            Self::AvailableBalances => AVAILABLE_BALANCES_SUBSCRIPTION,
        }
    }

    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::HouseBets => "HouseBets",
            Self::AvailableBalances => "AvailableBalances",
        }
    }
}

/// Active subscriptions of the current connection
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    active: HashMap<String, Subscription>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id for `subscription` and build its `subscribe` frame.
    pub fn register(&mut self, subscription: Subscription) -> MessageOut {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(id = %id, kind = subscription.operation_name(), "Registering subscription");
        self.active.insert(id.clone(), subscription);
        MessageOut::subscribe(id, subscription.query())
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
