use crate::store::{AdWatchAttempt, AdWatchOutcome, LedgerStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clad_types::{
    quota, AdWatchRecord, Energy, Order, OrderStatus, Result, RewardError, UserAccount, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<UserId, UserAccount>,
    daily_counts: HashMap<(UserId, String), u32>,
    claims: HashSet<(UserId, String)>,
    orders: HashMap<String, Order>,
    watch_log: Vec<AdWatchRecord>,
    sessions: HashMap<UserId, u64>,
}

impl LedgerState {
    fn account_entry(&mut self, user: &UserId, now: DateTime<Utc>) -> &mut UserAccount {
        self.accounts
            .entry(user.clone())
            .or_insert_with(|| UserAccount::new(user.clone(), now))
    }

    fn expire_boost_if_needed(account: &mut UserAccount, now: DateTime<Utc>) {
        if account.boost_expired(now) {
            debug!(
                user = %account.id,
                expired_level = account.boost_level,
                "Boost expired, resetting to base tier"
            );
            account.boost_level = 0;
            account.boost_expires_at = None;
        }
    }
}

/// In-memory ledger adapter. Every operation takes the write lock for its
/// whole read-modify-write and never awaits while holding it, so each
/// operation is one atomic step. Doubles as the injected test store.
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_or_create_account(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<UserAccount> {
        let mut state = self.state.write().await;
        let created = !state.accounts.contains_key(user);
        let account = state.account_entry(user, now).clone();
        if created {
            info!(
                user = %user,
                storage_type = "memory",
                "👤 Account created"
            );
        }
        Ok(account)
    }

    async fn get_account(&self, user: &UserId) -> Result<Option<UserAccount>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(user).cloned())
    }

    async fn clear_expired_boost(&self, user: &UserId, now: DateTime<Utc>) -> Result<UserAccount> {
        let mut state = self.state.write().await;
        let account = state.account_entry(user, now);
        LedgerState::expire_boost_if_needed(account, now);
        Ok(account.clone())
    }

    async fn commit_ad_watch(
        &self,
        user: &UserId,
        attempt: AdWatchAttempt,
    ) -> Result<AdWatchOutcome> {
        let mut state = self.state.write().await;
        let now = attempt.now;

        // Predicate and mutation run under one lock scope with no await,
        // the in-memory equivalent of a single conditional-update statement.
        let account = state.account_entry(user, now);
        LedgerState::expire_boost_if_needed(account, now);

        if let Some(remaining) =
            quota::cooldown_remaining(account.last_watch_at, now, attempt.cooldown_seconds)
        {
            return Err(RewardError::CooldownActive {
                remaining_seconds: remaining,
            });
        }

        let day = quota::day_key(now);
        let count = state
            .daily_counts
            .get(&(user.clone(), day.clone()))
            .copied()
            .unwrap_or(0);
        if count >= attempt.daily_limit {
            // Rejected before the increment: no slot is consumed.
            return Err(RewardError::DailyLimitReached);
        }

        let account = state.account_entry(user, now);
        let boost_level = account.boost_level;
        let multiplier = attempt.boosts.multiplier_for(boost_level);
        let reward = attempt.base_reward.scaled(multiplier);
        let new_balance = account
            .energy
            .checked_add(reward)
            .ok_or_else(|| RewardError::Store("energy balance overflow".to_string()))?;

        account.energy = new_balance;
        account.last_watch_at = Some(now);
        let boost_expires_at = account.boost_expires_at;

        let new_count = count + 1;
        state.daily_counts.insert((user.clone(), day), new_count);
        state.watch_log.push(AdWatchRecord {
            user_id: user.clone(),
            ad_id: attempt.ad_id,
            reward,
            base_reward: attempt.base_reward,
            multiplier,
            created_at: now,
        });

        Ok(AdWatchOutcome {
            reward,
            new_balance,
            multiplier,
            daily_remaining: attempt.daily_limit - new_count,
            boost_level,
            boost_expires_at,
            last_watch_at: now,
        })
    }

    async fn increment_daily_count(&self, user: &UserId, day: &str, limit: u32) -> Result<u32> {
        let mut state = self.state.write().await;
        let key = (user.clone(), day.to_string());
        let count = state.daily_counts.get(&key).copied().unwrap_or(0);
        if count >= limit {
            return Err(RewardError::DailyLimitReached);
        }
        let new_count = count + 1;
        state.daily_counts.insert(key, new_count);
        Ok(new_count)
    }

    async fn daily_count(&self, user: &UserId, day: &str) -> Result<u32> {
        let state = self.state.read().await;
        Ok(state
            .daily_counts
            .get(&(user.clone(), day.to_string()))
            .copied()
            .unwrap_or(0))
    }

    async fn claim_partner_reward(
        &self,
        user: &UserId,
        partner_id: &str,
        amount: Energy,
        now: DateTime<Utc>,
    ) -> Result<Energy> {
        let mut state = self.state.write().await;
        let key = (user.clone(), partner_id.to_string());
        if state.claims.contains(&key) {
            return Err(RewardError::AlreadyClaimed);
        }

        let account = state.account_entry(user, now);
        let new_balance = account
            .energy
            .checked_add(amount)
            .ok_or_else(|| RewardError::Store("energy balance overflow".to_string()))?;
        account.energy = new_balance;

        // Presence of the claim row alone is proof of a prior claim.
        state.claims.insert(key);

        info!(
            user = %user,
            partner_id = partner_id,
            reward = amount.units(),
            balance_after = new_balance.units(),
            storage_type = "memory",
            "💾 Partner claim recorded"
        );
        Ok(new_balance)
    }

    async fn claimed_partners(&self, user: &UserId) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut partners: Vec<String> = state
            .claims
            .iter()
            .filter(|(claim_user, _)| claim_user == user)
            .map(|(_, partner)| partner.clone())
            .collect();
        partners.sort();
        Ok(partners)
    }

    async fn insert_order(&self, order: Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.contains_key(&order.id) {
            return Err(RewardError::Store(format!(
                "duplicate order id: {}",
                order.id
            )));
        }
        debug!(
            order_id = %order.id,
            user = %order.user_id,
            boost_level = order.boost_level,
            storage_type = "memory",
            "📦 Order stored"
        );
        state.orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(order_id).cloned())
    }

    async fn settle_order(
        &self,
        order_id: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| RewardError::OrderNotFound(order_id.to_string()))?;

        if order.status != OrderStatus::Pending {
            return Err(RewardError::AlreadyProcessed);
        }

        order.status = OrderStatus::Paid;
        order.tx_hash = Some(tx_hash.to_string());
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn apply_boost(
        &self,
        user: &UserId,
        level: u8,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserAccount> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(user)
            .ok_or_else(|| RewardError::Store(format!("account not found: {}", user)))?;
        account.boost_level = level;
        account.boost_expires_at = expires_at;
        Ok(account.clone())
    }

    async fn watch_history(&self, user: &UserId, limit: usize) -> Result<Vec<AdWatchRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<AdWatchRecord> = state
            .watch_log
            .iter()
            .filter(|record| &record.user_id == user)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn watch_totals(&self, user: &UserId) -> Result<(u64, Energy)> {
        let state = self.state.read().await;
        let mut count = 0u64;
        let mut total = Energy::ZERO;
        for record in state.watch_log.iter().filter(|r| &r.user_id == user) {
            count += 1;
            total = total.saturating_add(record.reward);
        }
        Ok((count, total))
    }

    async fn record_session(&self, user: &UserId, _now: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        *state.sessions.entry(user.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn session_count(&self, user: &UserId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.sessions.get(user).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clad_types::BoostSchedule;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn attempt(now: DateTime<Utc>) -> AdWatchAttempt {
        AdWatchAttempt {
            ad_id: "default_ad".to_string(),
            now,
            base_reward: Energy::new(10),
            cooldown_seconds: 30,
            daily_limit: 200,
            boosts: BoostSchedule::default(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        let first = ledger.get_or_create_account(&u, now).await.unwrap();
        let second = ledger
            .get_or_create_account(&u, now + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.energy, Energy::ZERO);
    }

    #[tokio::test]
    async fn test_commit_ad_watch_applies_everything_atomically() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        let outcome = ledger.commit_ad_watch(&u, attempt(now)).await.unwrap();
        assert_eq!(outcome.reward, Energy::new(10));
        assert_eq!(outcome.new_balance, Energy::new(10));
        assert_eq!(outcome.daily_remaining, 199);

        let account = ledger.get_account(&u).await.unwrap().unwrap();
        assert_eq!(account.energy, Energy::new(10));
        assert_eq!(account.last_watch_at, Some(now));

        let day = quota::day_key(now);
        assert_eq!(ledger.daily_count(&u, &day).await.unwrap(), 1);
        assert_eq!(ledger.watch_history(&u, 20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_rejection_leaves_no_partial_state() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        ledger.commit_ad_watch(&u, attempt(now)).await.unwrap();
        let err = ledger
            .commit_ad_watch(&u, attempt(now + chrono::Duration::seconds(10)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RewardError::CooldownActive {
                remaining_seconds: 20
            }
        );

        let account = ledger.get_account(&u).await.unwrap().unwrap();
        assert_eq!(account.energy, Energy::new(10));
        assert_eq!(account.last_watch_at, Some(now));
        let day = quota::day_key(now);
        assert_eq!(ledger.daily_count(&u, &day).await.unwrap(), 1);
        assert_eq!(ledger.watch_history(&u, 20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_daily_limit_rejection_does_not_consume_slot() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");
        let day = quota::day_key(now);

        let mut att = attempt(now);
        att.daily_limit = 2;
        att.cooldown_seconds = 0;

        ledger.commit_ad_watch(&u, att.clone()).await.unwrap();
        ledger.commit_ad_watch(&u, att.clone()).await.unwrap();
        let err = ledger.commit_ad_watch(&u, att).await.unwrap_err();
        assert_eq!(err, RewardError::DailyLimitReached);

        assert_eq!(ledger.daily_count(&u, &day).await.unwrap(), 2);
        let account = ledger.get_account(&u).await.unwrap().unwrap();
        assert_eq!(account.energy, Energy::new(20));
    }

    #[tokio::test]
    async fn test_expired_boost_resets_before_multiplier() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        ledger.get_or_create_account(&u, now).await.unwrap();
        ledger
            .apply_boost(&u, 2, Some(now - chrono::Duration::hours(1)))
            .await
            .unwrap();

        let outcome = ledger.commit_ad_watch(&u, attempt(now)).await.unwrap();
        assert_eq!(outcome.boost_level, 0);
        assert_eq!(outcome.multiplier, 1.0);
        assert_eq!(outcome.reward, Energy::new(10));

        let account = ledger.get_account(&u).await.unwrap().unwrap();
        assert_eq!(account.boost_level, 0);
        assert_eq!(account.boost_expires_at, None);
    }

    #[tokio::test]
    async fn test_claim_is_insert_if_absent() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        let balance = ledger
            .claim_partner_reward(&u, "telegram_cladhunter_official", Energy::new(1000), now)
            .await
            .unwrap();
        assert_eq!(balance, Energy::new(1000));

        let err = ledger
            .claim_partner_reward(&u, "telegram_cladhunter_official", Energy::new(1000), now)
            .await
            .unwrap_err();
        assert_eq!(err, RewardError::AlreadyClaimed);

        let account = ledger.get_account(&u).await.unwrap().unwrap();
        assert_eq!(account.energy, Energy::new(1000));
        assert_eq!(
            ledger.claimed_partners(&u).await.unwrap(),
            vec!["telegram_cladhunter_official".to_string()]
        );
    }

    #[tokio::test]
    async fn test_settle_order_is_compare_and_set() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();
        let u = user("anon_a");

        let order = Order {
            id: "ord_1".to_string(),
            user_id: u.clone(),
            boost_level: 2,
            ton_amount: 1.2,
            status: OrderStatus::Pending,
            payload: "boost_2".to_string(),
            tx_hash: None,
            created_at: now,
            updated_at: now,
        };
        ledger.insert_order(order).await.unwrap();

        let settled = ledger.settle_order("ord_1", "tx_abc", now).await.unwrap();
        assert_eq!(settled.status, OrderStatus::Paid);
        assert_eq!(settled.tx_hash.as_deref(), Some("tx_abc"));

        let err = ledger.settle_order("ord_1", "tx_def", now).await.unwrap_err();
        assert_eq!(err, RewardError::AlreadyProcessed);

        let err = ledger.settle_order("missing", "tx", now).await.unwrap_err();
        assert_eq!(err, RewardError::OrderNotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_increment_daily_count_ceiling() {
        let ledger = MemoryLedger::new();
        let u = user("anon_a");

        assert_eq!(ledger.increment_daily_count(&u, "2026-08-26", 2).await.unwrap(), 1);
        assert_eq!(ledger.increment_daily_count(&u, "2026-08-26", 2).await.unwrap(), 2);
        assert_eq!(
            ledger
                .increment_daily_count(&u, "2026-08-26", 2)
                .await
                .unwrap_err(),
            RewardError::DailyLimitReached
        );
        // New day key starts a fresh window.
        assert_eq!(ledger.increment_daily_count(&u, "2026-08-27", 2).await.unwrap(), 1);
    }
}
