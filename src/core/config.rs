use crate::core::currency::{DEFAULT_BASE_CURRENCY, RATE_CACHE_TTL};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeolocationProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub exchange_rate: Option<ExchangeRateProviderConfig>,
    pub geolocation: Option<GeolocationProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rate: Some(ExchangeRateProviderConfig {
                base_url: "https://api.exchangerate-api.com".to_string(),
            }),
            geolocation: Some(GeolocationProviderConfig {
                base_url: "https://ipapi.co".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn exchange_rate_url(&self) -> &str {
        self.exchange_rate
            .as_ref()
            .map_or("https://api.exchangerate-api.com", |p| &p.base_url)
    }

    pub fn geolocation_url(&self) -> &str {
        self.geolocation
            .as_ref()
            .map_or("https://ipapi.co", |p| &p.base_url)
    }
}

fn default_base() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

fn default_ttl_secs() -> u64 {
    RATE_CACHE_TTL.as_secs()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrencyConfig {
    /// Currency product prices are stored in.
    #[serde(default = "default_base")]
    pub base: String,
    /// Skips location detection when set.
    pub default: Option<String>,
    #[serde(default = "default_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            default: None,
            cache_ttl_secs: default_ttl_secs(),
            refresh_interval_secs: default_ttl_secs(),
        }
    }
}

impl CurrencyConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if none exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "agumiya", "agumiya")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "agumiya", "agumiya")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
