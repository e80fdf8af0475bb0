use serde::{Deserialize, Serialize};
use std::fmt;

/// In-app credit balance. Integer units; never negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Energy(u64);

impl Energy {
    pub const ZERO: Self = Self(0);

    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Reward scaled by a boost multiplier, rounded down.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self((self.0 as f64 * multiplier).floor() as u64)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} energy", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_rounds_down() {
        assert_eq!(Energy::new(10).scaled(1.0), Energy::new(10));
        assert_eq!(Energy::new(10).scaled(1.25), Energy::new(12));
        assert_eq!(Energy::new(10).scaled(1.5), Energy::new(15));
        assert_eq!(Energy::new(10).scaled(3.0), Energy::new(30));
    }

    #[test]
    fn test_saturating_never_underflows() {
        assert_eq!(Energy::new(5).saturating_sub(Energy::new(10)), Energy::ZERO);
    }
}
