pub mod orders;
pub mod partners;
pub mod quota;
pub mod reward;

pub use orders::{
    BoostActivation, ManualTrustVerifier, OrderInvoice, OrderManager, PaymentVerifier,
};
pub use partners::PartnerRegistry;
pub use quota::QuotaTracker;
pub use reward::{BalanceView, ClaimReceipt, RewardConfig, RewardEngine, UserStats};
