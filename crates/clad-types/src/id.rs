use crate::error::{Result, RewardError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable opaque user identifier, either an authenticated subject id or an
/// anonymous device id prefixed with `anon_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RewardError::InvalidRequest("empty user id".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with("anon_")
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_id() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn test_anonymous_prefix() {
        assert!(UserId::new("anon_device1").unwrap().is_anonymous());
        assert!(!UserId::new("7f9c2ba4-e88f").unwrap().is_anonymous());
    }
}
