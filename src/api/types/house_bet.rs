//! House bet history types used to discover the account name.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BetUser {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// The polymorphic `bet` node; only the owning user matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct BetNode {
    #[serde(default)]
    pub user: Option<BetUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseBetEntry {
    #[serde(default)]
    pub iid: Option<String>,
    pub bet: BetNode,
}

impl HouseBetEntry {
    /// Name of the account that placed the bet.
    pub fn user_name(&self) -> Option<&str> {
        self.bet.user.as_ref().map(|u| u.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HouseBetListUser {
    #[serde(rename = "houseBetList")]
    pub house_bet_list: Option<Vec<HouseBetEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HouseBetListData {
    pub user: Option<HouseBetListUser>,
}

/// Envelope of the `UserHouseBets` query response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HouseBetListResponse {
    pub data: Option<HouseBetListData>,
}

impl HouseBetListResponse {
    pub(crate) fn into_entries(self) -> Option<Vec<HouseBetEntry>> {
        self.data?.user?.house_bet_list
    }
}
