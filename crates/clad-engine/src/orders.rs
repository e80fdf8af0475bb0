use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use clad_ledger::LedgerStore;
use clad_types::{BoostSchedule, Order, OrderStatus, Result, RewardError, UserId};
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Verification of a payment proof against the payment network.
///
/// This is an explicit trust boundary: the shipped default accepts proofs on
/// manual trust. A deployment that wants real on-chain verification swaps in
/// its own implementation without touching the order state machine.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, order: &Order, tx_hash: &str) -> Result<()>;
}

/// Default verifier: trusts the caller-supplied proof and says so loudly in
/// the logs.
pub struct ManualTrustVerifier;

#[async_trait]
impl PaymentVerifier for ManualTrustVerifier {
    async fn verify(&self, order: &Order, tx_hash: &str) -> Result<()> {
        warn!(
            order_id = %order.id,
            tx_hash = tx_hash,
            "⚠️ Payment accepted on manual trust, NOT verified on-chain"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderInvoice {
    pub order_id: String,
    pub address: String,
    pub amount_ton: f64,
    pub payload: String,
    pub boost_name: String,
    pub duration_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoostActivation {
    pub boost_level: u8,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub multiplier: f64,
}

/// Creates pending purchase orders and settles them exactly once against the
/// ledger's compare-and-set primitive.
pub struct OrderManager {
    store: Arc<dyn LedgerStore>,
    boosts: BoostSchedule,
    verifier: Arc<dyn PaymentVerifier>,
    merchant_address: String,
}

impl OrderManager {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        boosts: BoostSchedule,
        verifier: Arc<dyn PaymentVerifier>,
        merchant_address: String,
    ) -> Self {
        Self {
            store,
            boosts,
            verifier,
            merchant_address,
        }
    }

    /// Create a pending order for a purchasable tier (levels 1..=4). The id
    /// is blake3-derived with random salt so order ids are not guessable
    /// from user id or time.
    pub async fn create_order(
        &self,
        user: &UserId,
        boost_level: u8,
        now: DateTime<Utc>,
    ) -> Result<OrderInvoice> {
        let tier = self
            .boosts
            .tier(boost_level)
            .filter(|t| t.level > 0)
            .ok_or(RewardError::InvalidBoostLevel(boost_level))?;

        let order_id = generate_order_id(user, boost_level, now);
        let payload = format!(
            "boost_{}_{}_{}",
            boost_level,
            user,
            now.timestamp_millis()
        );

        let order = Order {
            id: order_id.clone(),
            user_id: user.clone(),
            boost_level,
            ton_amount: tier.cost_ton,
            status: OrderStatus::Pending,
            payload: payload.clone(),
            tx_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_order(order).await?;

        info!(
            user = %user,
            order_id = %order_id,
            boost_level = boost_level,
            amount_ton = tier.cost_ton,
            "🧾 Order created"
        );
        Ok(OrderInvoice {
            order_id,
            address: self.merchant_address.clone(),
            amount_ton: tier.cost_ton,
            payload,
            boost_name: tier.name.clone(),
            duration_days: tier.duration_days,
        })
    }

    /// Owner-checked order lookup.
    pub async fn get_order(&self, user: &UserId, order_id: &str) -> Result<Order> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| RewardError::OrderNotFound(order_id.to_string()))?;
        if &order.user_id != user {
            return Err(RewardError::Forbidden);
        }
        Ok(order)
    }

    /// Settle a pending order and activate its boost. The `pending -> paid`
    /// transition is a store-side compare-and-set, so a second confirm
    /// (same or different proof) fails with `AlreadyProcessed` and does not
    /// re-extend the boost.
    pub async fn confirm_order(
        &self,
        user: &UserId,
        order_id: &str,
        proof: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BoostActivation> {
        let order = self.get_order(user, order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(RewardError::AlreadyProcessed);
        }

        let tx_hash = match proof.filter(|p| !p.is_empty()) {
            Some(p) => p.to_string(),
            None => format!("demo_tx_{}", now.timestamp_millis()),
        };
        self.verifier.verify(&order, &tx_hash).await?;

        let settled = self.store.settle_order(order_id, &tx_hash, now).await?;

        let tier = self
            .boosts
            .tier(settled.boost_level)
            .ok_or(RewardError::InvalidBoostLevel(settled.boost_level))?;
        let expires_at = tier.duration_days.map(|days| now + Duration::days(days));

        self.store.get_or_create_account(user, now).await?;
        let account = self
            .store
            .apply_boost(user, settled.boost_level, expires_at)
            .await?;

        info!(
            user = %user,
            order_id = order_id,
            tx_hash = %tx_hash,
            boost_level = account.boost_level,
            multiplier = tier.multiplier,
            "🚀 Boost activated"
        );
        Ok(BoostActivation {
            boost_level: account.boost_level,
            boost_expires_at: account.boost_expires_at,
            multiplier: tier.multiplier,
        })
    }
}

fn generate_order_id(user: &UserId, boost_level: u8, now: DateTime<Utc>) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = blake3::Hasher::new();
    hasher.update(user.as_str().as_bytes());
    hasher.update(&[boost_level]);
    hasher.update(&now.timestamp_millis().to_le_bytes());
    hasher.update(&salt);
    format!("order_{}", hex::encode(&hasher.finalize().as_bytes()[..12]))
}
