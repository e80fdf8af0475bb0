use crate::partners::PartnerRegistry;
use crate::quota::QuotaTracker;
use chrono::{DateTime, Utc};
use clad_ledger::{AdWatchAttempt, AdWatchOutcome, LedgerStore};
use clad_types::{
    economy, AdWatchRecord, BoostSchedule, Energy, Result, RewardError, UserAccount, UserId,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RewardConfig {
    pub base_reward: Energy,
    pub cooldown_seconds: i64,
    pub daily_view_limit: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_reward: economy::BASE_AD_REWARD,
            cooldown_seconds: economy::AD_COOLDOWN_SECONDS,
            daily_view_limit: economy::DAILY_VIEW_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    pub reward: Energy,
    pub new_balance: Energy,
    pub partner_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub energy: Energy,
    pub boost_level: u8,
    pub multiplier: f64,
    pub boost_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_energy: Energy,
    pub total_watches: u64,
    pub total_earned: Energy,
    pub total_sessions: u64,
    pub today_watches: u32,
    pub daily_limit: u32,
    pub boost_level: u8,
    pub multiplier: f64,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub watch_history: Vec<AdWatchRecord>,
}

/// The sole writer of balance and boost mutations. Stateless per request;
/// all cross-request correctness comes from the ledger's atomic operations.
pub struct RewardEngine {
    store: Arc<dyn LedgerStore>,
    partners: Arc<PartnerRegistry>,
    quota: QuotaTracker,
    boosts: BoostSchedule,
    config: RewardConfig,
}

impl RewardEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        partners: Arc<PartnerRegistry>,
        boosts: BoostSchedule,
        config: RewardConfig,
    ) -> Self {
        let quota = QuotaTracker::new(
            store.clone(),
            config.daily_view_limit,
            config.cooldown_seconds,
        );
        Self {
            store,
            partners,
            quota,
            boosts,
            config,
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn boosts(&self) -> &BoostSchedule {
        &self.boosts
    }

    pub fn partners(&self) -> &PartnerRegistry {
        &self.partners
    }

    /// Credit one ad watch. Cooldown, daily quota, lazy boost expiry, the
    /// balance credit and the audit record are committed as a single atomic
    /// store operation, so racing calls for one user serialize in the store
    /// and each accepted call is applied exactly once.
    pub async fn award_ad_watch(
        &self,
        user: &UserId,
        ad_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AdWatchOutcome> {
        if ad_id.trim().is_empty() {
            return Err(RewardError::InvalidRequest("missing ad_id".to_string()));
        }

        let outcome = self
            .store
            .commit_ad_watch(
                user,
                AdWatchAttempt {
                    ad_id: ad_id.to_string(),
                    now,
                    base_reward: self.config.base_reward,
                    cooldown_seconds: self.config.cooldown_seconds,
                    daily_limit: self.config.daily_view_limit,
                    boosts: self.boosts.clone(),
                },
            )
            .await?;

        info!(
            user = %user,
            ad_id = ad_id,
            reward = outcome.reward.units(),
            multiplier = outcome.multiplier,
            balance_after = outcome.new_balance.units(),
            daily_remaining = outcome.daily_remaining,
            "💰 Ad reward credited"
        );
        Ok(outcome)
    }

    /// One-time partner reward. The credited amount comes from the registry
    /// and only the registry; the claim row insert and the credit are one
    /// atomic store operation, so a duplicate claim reports `AlreadyClaimed`
    /// whether it races the winner or arrives later.
    pub async fn claim_partner_reward(
        &self,
        user: &UserId,
        partner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt> {
        let partner = self.partners.require_active(partner_id)?;

        let new_balance = self
            .store
            .claim_partner_reward(user, partner_id, partner.reward, now)
            .await?;

        info!(
            user = %user,
            partner_id = partner_id,
            reward = partner.reward.units(),
            balance_after = new_balance.units(),
            "🎁 Partner reward claimed"
        );
        Ok(ClaimReceipt {
            reward: partner.reward,
            new_balance,
            partner_name: partner.name.clone(),
        })
    }

    /// Load-or-create the account, apply lazy boost expiry and record a
    /// session.
    pub async fn init_user(&self, user: &UserId, now: DateTime<Utc>) -> Result<UserAccount> {
        let account = self.store.clear_expired_boost(user, now).await?;

        // Session accounting is best-effort; a failure must not fail init.
        if let Err(e) = self.store.record_session(user, now).await {
            warn!(user = %user, error = %e, "Failed to record session");
        }
        Ok(account)
    }

    /// Snapshot balance read with lazy boost expiry.
    pub async fn balance(&self, user: &UserId, now: DateTime<Utc>) -> Result<BalanceView> {
        let account = self.store.clear_expired_boost(user, now).await?;
        Ok(BalanceView {
            energy: account.energy,
            boost_level: account.boost_level,
            multiplier: self.boosts.multiplier_for(account.boost_level),
            boost_expires_at: account.boost_expires_at,
        })
    }

    /// Snapshot-consistent usage stats; reads only, retried once on
    /// transient store failures.
    pub async fn stats(&self, user: &UserId, now: DateTime<Utc>) -> Result<UserStats> {
        let account = self.store.clear_expired_boost(user, now).await?;
        let (total_watches, total_earned) =
            retry_transient(|| self.store.watch_totals(user)).await?;
        let watch_history = retry_transient(|| self.store.watch_history(user, 20)).await?;
        let total_sessions = retry_transient(|| self.store.session_count(user)).await?;
        let today_watches = self.quota.used_today(user, now).await?;

        Ok(UserStats {
            total_energy: account.energy,
            total_watches,
            total_earned,
            total_sessions,
            today_watches,
            daily_limit: self.config.daily_view_limit,
            boost_level: account.boost_level,
            multiplier: self.boosts.multiplier_for(account.boost_level),
            boost_expires_at: account.boost_expires_at,
            watch_history,
        })
    }

    /// Partner ids this user has already claimed.
    pub async fn reward_status(&self, user: &UserId) -> Result<Vec<String>> {
        retry_transient(|| self.store.claimed_partners(user)).await
    }
}

/// Retry a strictly idempotent (read-only) store operation once after a
/// transient failure. Non-idempotent writes are never routed through here.
async fn retry_transient<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "Transient store failure, retrying read");
            tokio::time::sleep(Duration::from_millis(50)).await;
            op().await
        }
        other => other,
    }
}
