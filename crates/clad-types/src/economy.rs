use crate::energy::Energy;
use serde::{Deserialize, Serialize};

pub const BASE_AD_REWARD: Energy = Energy::new(10);
pub const DAILY_VIEW_LIMIT: u32 = 200;
pub const AD_COOLDOWN_SECONDS: i64 = 30;

/// Conversion rate between the payment asset and energy.
pub const TON_TO_ENERGY_RATE: f64 = 100_000.0;

pub fn energy_to_ton(energy: Energy) -> f64 {
    energy.units() as f64 / TON_TO_ENERGY_RATE
}

pub fn ton_to_energy(ton: f64) -> Energy {
    Energy::new((ton * TON_TO_ENERGY_RATE) as u64)
}

/// A purchasable multiplier tier. Level 0 is the free base tier and cannot
/// be ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostTier {
    pub level: u8,
    pub name: String,
    pub multiplier: f64,
    pub cost_ton: f64,
    pub duration_days: Option<i64>,
}

/// Server-held table of boost tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostSchedule {
    tiers: Vec<BoostTier>,
}

impl Default for BoostSchedule {
    fn default() -> Self {
        let tier = |level, name: &str, multiplier, cost_ton, duration_days| BoostTier {
            level,
            name: name.to_string(),
            multiplier,
            cost_ton,
            duration_days,
        };
        Self {
            tiers: vec![
                tier(0, "Base", 1.0, 0.0, None),
                tier(1, "Bronze", 1.25, 0.5, Some(7)),
                tier(2, "Silver", 1.5, 1.2, Some(14)),
                tier(3, "Gold", 2.0, 2.8, Some(30)),
                tier(4, "Diamond", 3.0, 6.0, Some(60)),
            ],
        }
    }
}

impl BoostSchedule {
    pub fn new(tiers: Vec<BoostTier>) -> Self {
        Self { tiers }
    }

    pub fn tier(&self, level: u8) -> Option<&BoostTier> {
        self.tiers.iter().find(|t| t.level == level)
    }

    /// Unknown levels fall back to multiplier 1, matching the base tier.
    pub fn multiplier_for(&self, level: u8) -> f64 {
        self.tier(level).map(|t| t.multiplier).unwrap_or(1.0)
    }

    pub fn tiers(&self) -> &[BoostTier] {
        &self.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let schedule = BoostSchedule::default();
        assert_eq!(schedule.tiers().len(), 5);
        assert_eq!(schedule.multiplier_for(0), 1.0);
        assert_eq!(schedule.multiplier_for(3), 2.0);
        assert_eq!(schedule.multiplier_for(99), 1.0);
        assert_eq!(schedule.tier(4).unwrap().duration_days, Some(60));
    }

    #[test]
    fn test_ton_conversions() {
        assert_eq!(ton_to_energy(0.5), Energy::new(50_000));
        assert_eq!(energy_to_ton(Energy::new(100_000)), 1.0);
    }
}
