//! The fixed operation set a provider module may implement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    StartSession,
    HandleSpin,
    PlaceBet,
    ContinueBet,
    PlaceChoose,
    PlaceBonusBet,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::StartSession,
        Capability::HandleSpin,
        Capability::PlaceBet,
        Capability::ContinueBet,
        Capability::PlaceChoose,
        Capability::PlaceBonusBet,
    ];

    /// Canonical operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartSession => "startSession",
            Self::HandleSpin => "handleSpin",
            Self::PlaceBet => "placeBet",
            Self::ContinueBet => "continueBet",
            Self::PlaceChoose => "placeChoose",
            Self::PlaceBonusBet => "placeBonusBet",
        }
    }

    /// Exact (case-sensitive) lookup by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown capability: {}", s))
    }
}
