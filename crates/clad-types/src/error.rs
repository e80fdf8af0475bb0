use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewardError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Cooldown active: {remaining_seconds}s remaining")]
    CooldownActive { remaining_seconds: i64 },

    #[error("Daily limit reached")]
    DailyLimitReached,

    #[error("Reward already claimed")]
    AlreadyClaimed,

    #[error("Order already processed")]
    AlreadyProcessed,

    #[error("Invalid boost level: {0}")]
    InvalidBoostLevel(u8),

    #[error("Partner not found: {0}")]
    PartnerNotFound(String),

    #[error("Partner inactive: {0}")]
    PartnerInactive(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl RewardError {
    /// Transient infrastructure failures; safe to retry only for
    /// idempotent operations.
    pub fn is_transient(&self) -> bool {
        matches!(self, RewardError::Store(_))
    }
}

impl From<serde_json::Error> for RewardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RewardError>;
