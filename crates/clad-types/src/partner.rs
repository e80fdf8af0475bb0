use crate::energy::Energy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    X,
    Youtube,
    Instagram,
    Discord,
}

/// A partner channel users can subscribe to for a one-time reward. The
/// reward amount is server-held configuration and never taken from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerReward {
    pub id: String,
    pub platform: Platform,
    pub name: String,
    pub username: String,
    pub url: String,
    pub reward: Energy,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub active: bool,
}
