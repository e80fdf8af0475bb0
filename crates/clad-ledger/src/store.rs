use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clad_types::{AdWatchRecord, BoostSchedule, Energy, Order, Result, UserAccount, UserId};
use serde::Serialize;

/// Parameters for the single atomic ad-watch commit. Carried into the store
/// so the cooldown/quota predicate is evaluated against the row's current
/// state, not a stale read in the engine.
#[derive(Debug, Clone)]
pub struct AdWatchAttempt {
    pub ad_id: String,
    pub now: DateTime<Utc>,
    pub base_reward: Energy,
    pub cooldown_seconds: i64,
    pub daily_limit: u32,
    pub boosts: BoostSchedule,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdWatchOutcome {
    pub reward: Energy,
    pub new_balance: Energy,
    pub multiplier: f64,
    pub daily_remaining: u32,
    pub boost_level: u8,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub last_watch_at: DateTime<Utc>,
}

/// Durable storage contract for balances, counters, claims and orders.
///
/// The reward engine is written once against this trait; adapters translate
/// each operation into their backend's native atomic primitive. Four
/// primitive categories cover everything:
///
/// - get-or-create by id (`get_or_create_account`)
/// - atomic conditional update (`commit_ad_watch`, `clear_expired_boost`,
///   `settle_order`, `increment_daily_count`)
/// - atomic insert-if-absent (`claim_partner_reward`, `insert_order`)
/// - append-only log insert (the watch log inside `commit_ad_watch`,
///   `record_session`)
///
/// Correctness under concurrent requests must come from the atomicity of
/// these operations alone; callers hold no in-process lock across a store
/// await, because that provides no cross-instance safety.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert-if-absent: concurrent creations converge on one zero-balance
    /// record.
    async fn get_or_create_account(&self, user: &UserId, now: DateTime<Utc>)
        -> Result<UserAccount>;

    async fn get_account(&self, user: &UserId) -> Result<Option<UserAccount>>;

    /// Conditional update: reset the boost to level 0 only if
    /// `boost_expires_at` is in the past. Creates the account if absent.
    /// Returns the post-condition account.
    async fn clear_expired_boost(&self, user: &UserId, now: DateTime<Utc>) -> Result<UserAccount>;

    /// The collapsed award operation: verify cooldown and daily quota,
    /// lazily expire the boost, credit the scaled reward, stamp
    /// `last_watch_at`, bump the daily counter and append one audit record
    /// in ONE atomic step. A rejection leaves no partial state behind, in
    /// particular no consumed daily slot.
    async fn commit_ad_watch(&self, user: &UserId, attempt: AdWatchAttempt)
        -> Result<AdWatchOutcome>;

    /// Atomic increment-with-ceiling: increments only if the result stays
    /// within `limit`, otherwise fails without consuming a slot.
    async fn increment_daily_count(&self, user: &UserId, day: &str, limit: u32) -> Result<u32>;

    async fn daily_count(&self, user: &UserId, day: &str) -> Result<u32>;

    /// Insert-if-absent of the `(user, partner)` claim row fused with the
    /// balance credit. A pre-existing row fails with `AlreadyClaimed` and
    /// applies no balance change; under concurrent duplicates exactly one
    /// call succeeds. Returns the new balance.
    async fn claim_partner_reward(
        &self,
        user: &UserId,
        partner_id: &str,
        amount: Energy,
        now: DateTime<Utc>,
    ) -> Result<Energy>;

    async fn claimed_partners(&self, user: &UserId) -> Result<Vec<String>>;

    /// Insert-if-absent keyed by order id.
    async fn insert_order(&self, order: Order) -> Result<()>;

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>>;

    /// Compare-and-set `pending -> paid`, storing the payment proof. Any
    /// other current status fails with `AlreadyProcessed`. Returns the
    /// settled order.
    async fn settle_order(
        &self,
        order_id: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Order>;

    /// Engine-only boost write.
    async fn apply_boost(
        &self,
        user: &UserId,
        level: u8,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserAccount>;

    /// Audit log reads, newest first.
    async fn watch_history(&self, user: &UserId, limit: usize) -> Result<Vec<AdWatchRecord>>;

    /// Lifetime `(watch count, total reward)` for a user.
    async fn watch_totals(&self, user: &UserId) -> Result<(u64, Energy)>;

    async fn record_session(&self, user: &UserId, now: DateTime<Utc>) -> Result<()>;

    async fn session_count(&self, user: &UserId) -> Result<u64>;
}
