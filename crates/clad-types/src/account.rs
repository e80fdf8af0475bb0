use crate::energy::Energy;
use crate::id::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable per-user balance record. The reward engine is the only writer of
/// `energy`, `boost_level` and `boost_expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub energy: Energy,
    pub boost_level: u8,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub last_watch_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            energy: Energy::ZERO,
            boost_level: 0,
            boost_expires_at: None,
            last_watch_at: None,
            created_at: now,
        }
    }

    /// Boost level with lazy expiry applied: an expired boost reads as 0
    /// even before the stored row has been reset.
    pub fn effective_boost_level(&self, now: DateTime<Utc>) -> u8 {
        match self.boost_expires_at {
            Some(expires) if expires <= now => 0,
            _ => self.boost_level,
        }
    }

    pub fn boost_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.boost_expires_at, Some(expires) if expires <= now)
    }
}

/// Append-only audit row, created exactly once per successful ad-watch
/// credit and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdWatchRecord {
    pub user_id: UserId,
    pub ad_id: String,
    pub reward: Energy,
    pub base_reward: Energy,
    pub multiplier: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    // Settable only by an out-of-scope expiry sweep; no confirm path
    // transitions here.
    Failed,
}

/// Pending-to-paid record correlating a boost purchase with an expected
/// external payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: UserId,
    pub boost_level: u8,
    pub ton_amount: f64,
    pub status: OrderStatus,
    pub payload: String,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
