use chrono::{DateTime, Utc};
use clad_ledger::LedgerStore;
use clad_types::{quota, Result, RewardError, UserId};
use std::sync::Arc;

/// Cooldown and daily-ceiling enforcement. Pure logic plus delegation to the
/// ledger's atomic counter primitive; no persistence of its own.
///
/// The award path does not call through here a second time: it hands the
/// same parameters to the store's collapsed `commit_ad_watch` so check and
/// mutation are one atomic step. This type serves pre-checks and read-side
/// queries (remaining quota, stats).
pub struct QuotaTracker {
    store: Arc<dyn LedgerStore>,
    daily_limit: u32,
    cooldown_seconds: i64,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn LedgerStore>, daily_limit: u32, cooldown_seconds: i64) -> Self {
        Self {
            store,
            daily_limit,
            cooldown_seconds,
        }
    }

    /// Pure cooldown check against an already-loaded account snapshot.
    pub fn check_cooldown(
        &self,
        last_watch_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match quota::cooldown_remaining(last_watch_at, now, self.cooldown_seconds) {
            Some(remaining) => Err(RewardError::CooldownActive {
                remaining_seconds: remaining,
            }),
            None => Ok(()),
        }
    }

    /// Atomic increment-with-ceiling for the UTC day containing `now`.
    pub async fn try_consume_daily_quota(&self, user: &UserId, now: DateTime<Utc>) -> Result<u32> {
        let day = quota::day_key(now);
        self.store
            .increment_daily_count(user, &day, self.daily_limit)
            .await
    }

    pub async fn used_today(&self, user: &UserId, now: DateTime<Utc>) -> Result<u32> {
        let day = quota::day_key(now);
        self.store.daily_count(user, &day).await
    }

    pub async fn remaining_today(&self, user: &UserId, now: DateTime<Utc>) -> Result<u32> {
        let used = self.used_today(user, now).await?;
        Ok(self.daily_limit.saturating_sub(used))
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use clad_ledger::MemoryLedger;

    fn tracker() -> QuotaTracker {
        QuotaTracker::new(Arc::new(MemoryLedger::new()), 3, 30)
    }

    #[test]
    fn test_check_cooldown() {
        let t = tracker();
        let now = Utc::now();

        assert!(t.check_cooldown(None, now).is_ok());
        assert!(t
            .check_cooldown(Some(now - Duration::seconds(30)), now)
            .is_ok());

        let err = t
            .check_cooldown(Some(now - Duration::seconds(10)), now)
            .unwrap_err();
        assert_eq!(
            err,
            RewardError::CooldownActive {
                remaining_seconds: 20
            }
        );
    }

    #[tokio::test]
    async fn test_daily_quota_window() {
        let t = tracker();
        let now = Utc::now();
        let user = UserId::new("anon_q").unwrap();

        for expected in 1..=3 {
            assert_eq!(
                t.try_consume_daily_quota(&user, now).await.unwrap(),
                expected
            );
        }
        assert_eq!(
            t.try_consume_daily_quota(&user, now).await.unwrap_err(),
            RewardError::DailyLimitReached
        );

        assert_eq!(t.remaining_today(&user, now).await.unwrap(), 0);

        // The counter resets implicitly with the next UTC day key.
        let tomorrow = now + Duration::days(1);
        assert_eq!(t.try_consume_daily_quota(&user, tomorrow).await.unwrap(), 1);
        assert_eq!(t.remaining_today(&user, tomorrow).await.unwrap(), 2);
    }
}
