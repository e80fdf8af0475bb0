use clad_types::{Energy, PartnerReward, Platform, Result, RewardError};
use std::collections::HashMap;
use tracing::info;

/// Server-held registry of partner channels. Reward amounts are sourced only
/// from here; callers can never influence the credited value.
pub struct PartnerRegistry {
    partners: HashMap<String, PartnerReward>,
}

impl PartnerRegistry {
    pub fn new(partners: Vec<PartnerReward>) -> Self {
        info!(partner_count = partners.len(), "🤝 Partner registry loaded");
        Self {
            partners: partners.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, partner_id: &str) -> Option<&PartnerReward> {
        self.partners.get(partner_id)
    }

    /// Lookup that enforces existence and the active flag.
    pub fn require_active(&self, partner_id: &str) -> Result<&PartnerReward> {
        let partner = self
            .partners
            .get(partner_id)
            .ok_or_else(|| RewardError::PartnerNotFound(partner_id.to_string()))?;
        if !partner.active {
            return Err(RewardError::PartnerInactive(partner_id.to_string()));
        }
        Ok(partner)
    }

    pub fn active_partners(&self) -> Vec<&PartnerReward> {
        let mut active: Vec<&PartnerReward> =
            self.partners.values().filter(|p| p.active).collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }
}

impl Default for PartnerRegistry {
    fn default() -> Self {
        let partner = |id: &str, platform, name: &str, username: &str, url: &str, reward, icon: &str| {
            PartnerReward {
                id: id.to_string(),
                platform,
                name: name.to_string(),
                username: username.to_string(),
                url: url.to_string(),
                reward: Energy::new(reward),
                description: None,
                icon: Some(icon.to_string()),
                active: true,
            }
        };
        Self::new(vec![
            partner(
                "telegram_cladhunter_official",
                Platform::Telegram,
                "Cladhunter Official",
                "@cladhunter",
                "https://t.me/cladhunter",
                1000,
                "📢",
            ),
            partner(
                "telegram_crypto_insights",
                Platform::Telegram,
                "Crypto Insights",
                "@cryptoinsights",
                "https://t.me/cryptoinsights",
                750,
                "💰",
            ),
            partner(
                "x_cladhunter",
                Platform::X,
                "Cladhunter X",
                "@cladhunter",
                "https://x.com/cladhunter",
                800,
                "🐦",
            ),
            partner(
                "youtube_crypto_tutorials",
                Platform::Youtube,
                "Crypto Tutorials",
                "@cryptotutorials",
                "https://youtube.com/@cryptotutorials",
                500,
                "🎥",
            ),
        ])
    }
}
