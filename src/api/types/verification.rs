//! Outcome of account verification.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of checking the logged-in account against local subscription records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// Subscription active until `until`.
    Valid { username: String, until: DateTime<Utc> },
    /// A subscription exists but ended on `expired_on`.
    NeedsRenewal {
        username: String,
        expired_on: DateTime<Utc>,
    },
    /// The account has never subscribed.
    NeedsSubscription { username: String },
    /// The account could not be identified.
    Unverified,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Account name discovered during verification, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Valid { username, .. }
            | Self::NeedsRenewal { username, .. }
            | Self::NeedsSubscription { username } => Some(username),
            Self::Unverified => None,
        }
    }

    /// User-facing message for the UI.
    pub fn message(&self) -> String {
        match self {
            Self::Valid { username, until } => format!(
                "Welcome back, {}! Your subscription is valid until {}.",
                username,
                until.format("%Y-%m-%d")
            ),
            Self::NeedsRenewal { expired_on, .. } => format!(
                "Your subscription expired on {}. Please renew to continue.",
                expired_on.format("%Y-%m-%d")
            ),
            Self::NeedsSubscription { username } => format!(
                "Welcome, {}! Please subscribe to use the application.",
                username
            ),
            Self::Unverified => "Failed to verify user. Please try again.".to_string(),
        }
    }
}
