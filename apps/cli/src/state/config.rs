//! # Application Configuration
//!
//! Loads `codemart.toml`, applies `CODEMART_*` environment overrides and
//! validates the result.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (every section is optional)                               │
//! │  2. codemart.toml (--config, or the platform config directory)         │
//! │  3. CODEMART_* environment variables                                   │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! [gateway]
//! base_url = "https://shop.example.com/wp-json/codemart/v1"
//! timeout_secs = 15
//!
//! [pricing]
//! base_rate = "110"
//! profit = "50"
//! currency = "NPR"
//!
//! [storage]
//! database_path = "/var/lib/codemart/codemart.db"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use codemart_core::{ExchangeRate, Money, PricingPolicy, DEFAULT_BASE_RATE, DEFAULT_PROFIT};
use codemart_gateway::{GatewayConfig, GatewayError};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

impl From<GatewayError> for ConfigError {
    fn from(err: GatewayError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Fallback pricing used when the gateway doesn't send a rate or margin.
///
/// Amounts are decimal strings so the file never holds floats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Shop currency per unit of face-value currency.
    #[serde(default = "default_base_rate")]
    pub base_rate: String,

    /// Fixed margin added to every bundle, in shop currency.
    #[serde(default = "default_profit")]
    pub profit: String,

    /// Face-value currency sent with bundle requests.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_base_rate() -> String {
    DEFAULT_BASE_RATE.to_string()
}
fn default_profit() -> String {
    DEFAULT_PROFIT.to_string()
}
fn default_currency() -> String {
    "NPR".to_string()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            base_rate: default_base_rate(),
            profit: default_profit(),
            currency: default_currency(),
        }
    }
}

impl PricingSettings {
    /// Parses the settings into a [`PricingPolicy`].
    pub fn policy(&self) -> ConfigResult<PricingPolicy> {
        let base_rate = ExchangeRate::parse_decimal(&self.base_rate)
            .map_err(|e| ConfigError::Invalid(format!("pricing.base_rate: {e}")))?;
        if !base_rate.is_positive() {
            return Err(ConfigError::Invalid(
                "pricing.base_rate must be greater than 0".into(),
            ));
        }

        let profit = Money::parse_decimal(&self.profit)
            .map_err(|e| ConfigError::Invalid(format!("pricing.profit: {e}")))?;
        if profit.is_negative() {
            return Err(ConfigError::Invalid(
                "pricing.profit must not be negative".into(),
            ));
        }

        Ok(PricingPolicy { base_rate, profit })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Local state database. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file. Falls back to the platform config
    ///   directory; a missing file means defaults.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::LoadFailed(format!("{}: {e}", path.display())))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`AppConfig::load`], but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.gateway.validate()?;
        self.pricing.policy()?;

        if self.pricing.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("pricing.currency must not be empty".into()));
        }

        Ok(())
    }

    pub fn pricing_policy(&self) -> ConfigResult<PricingPolicy> {
        self.pricing.policy()
    }

    /// The configured database path, or `codemart.db` in the platform
    /// data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage.database_path.clone().or_else(|| {
            ProjectDirs::from("com", "codemart", "storefront")
                .map(|dirs| dirs.data_dir().join("codemart.db"))
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `CODEMART_*` overrides read through `lookup`. Unparsable
    /// numbers are ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CODEMART_GATEWAY_URL") {
            debug!(url = %url, "Overriding gateway URL from environment");
            self.gateway.base_url = url;
        }

        if let Some(timeout) = lookup("CODEMART_GATEWAY_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.gateway.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid CODEMART_GATEWAY_TIMEOUT"),
            }
        }

        if let Some(rate) = lookup("CODEMART_BASE_RATE") {
            self.pricing.base_rate = rate;
        }

        if let Some(profit) = lookup("CODEMART_PROFIT") {
            self.pricing.profit = profit;
        }

        if let Some(currency) = lookup("CODEMART_CURRENCY") {
            self.pricing.currency = currency;
        }

        if let Some(path) = lookup("CODEMART_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    /// `codemart.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "codemart", "storefront")
            .map(|dirs| dirs.config_dir().join("codemart.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let policy = config.pricing_policy().unwrap();
        assert_eq!(policy, PricingPolicy::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.pricing.base_rate = "0".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.pricing.base_rate = "132.75".into();
        config.pricing.profit = "-1".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.pricing.profit = "0".into();
        assert!(config.validate().is_ok());

        config.gateway.base_url = "ftp://shop.example.com".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [pricing]
            base_rate = "132.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.profit, "50");
        assert_eq!(config.gateway, GatewayConfig::default());
        assert_eq!(
            config.pricing_policy().unwrap().base_rate,
            ExchangeRate::from_e4(1_325_000)
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CODEMART_GATEWAY_URL", "https://api.example.com/v1"),
            ("CODEMART_GATEWAY_TIMEOUT", "soon"),
            ("CODEMART_CURRENCY", "USD"),
            ("CODEMART_DB_PATH", "/tmp/codemart.db"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.gateway.base_url, "https://api.example.com/v1");
        assert_eq!(config.gateway.timeout_secs, 15);
        assert_eq!(config.pricing.currency, "USD");
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/codemart.db")));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[gateway]"));
        assert!(toml_str.contains("[pricing]"));

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("codemart-config-{}", std::process::id()))
            .join("codemart.toml");

        let mut config = AppConfig::default();
        config.pricing.currency = "USD".into();
        config.save(Some(path.clone())).unwrap();

        let loaded = AppConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.pricing.currency, "USD");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
