use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_PREFIX: &str = "AD_RANKING_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment configuration: {0}")]
    Env(#[from] envy::Error),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}

/// Settings read from `AD_RANKING_*` variables (and `.env`)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Directory holding persisted histories
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// JSON catalog; the built-in reference catalog when unset
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,
    /// Reasons shown per ad
    #[serde(default = "default_display_reasons")]
    pub display_reasons: usize,
}

fn default_service_name() -> String {
    "ad-ranking-service".to_string()
}

fn default_history_dir() -> PathBuf {
    PathBuf::from(".ad-ranking")
}

fn default_storage_key() -> String {
    crate::services::tracking::DEFAULT_STORAGE_KEY.to_string()
}

fn default_feed_limit() -> usize {
    10
}

fn default_display_reasons() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            history_dir: default_history_dir(),
            storage_key: default_storage_key(),
            catalog_path: None,
            feed_limit: default_feed_limit(),
            display_reasons: default_display_reasons(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Parse from explicit `(key, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_limit == 0 {
            return Err(ConfigError::NonPositive("AD_RANKING_FEED_LIMIT"));
        }
        Ok(())
    }
}
