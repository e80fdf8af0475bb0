use anyhow::Result;
use clad_types::{economy, PartnerReward};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSettings,
    pub auth: AuthConfig,
    pub economy: EconomyConfig,
    /// Server-held partner registry; empty means the built-in defaults.
    pub partners: Vec<PartnerReward>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: "clad-node".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared key presented by anonymous clients alongside an `X-User-ID`
    /// device id.
    pub anon_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            anon_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub base_reward: u64,
    pub cooldown_seconds: i64,
    pub daily_view_limit: u32,
    /// Payment destination handed to clients in order invoices.
    pub merchant_address: String,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_reward: economy::BASE_AD_REWARD.units(),
            cooldown_seconds: economy::AD_COOLDOWN_SECONDS,
            daily_view_limit: economy::DAILY_VIEW_LIMIT,
            merchant_address: "UQD_merchant_address_placeholder".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty", "compact" or "json".
    pub format: String,
    pub file_output: Option<PathBuf>,
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_output: None,
            module_filters: HashMap::new(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings::default(),
            auth: AuthConfig::default(),
            economy: EconomyConfig::default(),
            partners: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Secrets come from the environment when set, overriding the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(anon_key) = env::var("CLAD_ANON_KEY") {
            self.auth.anon_key = anon_key;
        }
        if let Ok(address) = env::var("TON_MERCHANT_ADDRESS") {
            self.economy.merchant_address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_economy_constants() {
        let config = NodeConfig::default();
        assert_eq!(config.economy.base_reward, 10);
        assert_eq!(config.economy.cooldown_seconds, 30);
        assert_eq!(config.economy.daily_view_limit, 200);
        assert_eq!(config.node.port, 8080);
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clad-config.toml");

        let mut config = NodeConfig::default();
        config.node.port = 9191;
        config.auth.anon_key = "anon_key_123".to_string();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = NodeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.node.port, 9191);
        assert_eq!(loaded.auth.anon_key, "anon_key_123");
        assert_eq!(loaded.economy.daily_view_limit, 200);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: NodeConfig = toml::from_str(
            r#"
            [node]
            port = 9090

            [economy]
            cooldown_seconds = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.node.port, 9090);
        assert_eq!(config.node.host, "127.0.0.1");
        assert_eq!(config.economy.cooldown_seconds, 5);
        assert_eq!(config.economy.daily_view_limit, 200);
        assert!(config.partners.is_empty());
    }
}
