pub mod account;
pub mod economy;
pub mod energy;
pub mod error;
pub mod id;
pub mod partner;
pub mod quota;

pub use account::{AdWatchRecord, Order, OrderStatus, UserAccount};
pub use economy::{BoostSchedule, BoostTier};
pub use energy::Energy;
pub use error::{Result, RewardError};
pub use id::UserId;
pub use partner::{PartnerReward, Platform};
