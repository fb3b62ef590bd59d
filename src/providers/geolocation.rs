use crate::core::catalog::country_from_locale;
use crate::core::currency::LocationProvider;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// One-shot IP geolocation against an ipapi-style `/json/` endpoint.
pub struct IpApiLocator {
    base_url: String,
}

impl IpApiLocator {
    pub fn new(base_url: &str) -> Self {
        IpApiLocator {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    #[serde(alias = "countryCode")]
    country_code: Option<String>,
}

#[async_trait]
impl LocationProvider for IpApiLocator {
    async fn detect_country(&self) -> Result<String> {
        let url = format!("{}/json/", self.base_url);
        debug!("Requesting location from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("agumiya/1.0")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Location request error: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Location HTTP error: {}", response.status()));
        }

        let data: GeolocationResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse location response: {}", e))?;

        data.country_code
            .map(|code| code.trim().to_ascii_uppercase())
            .filter(|code| code.len() == 2)
            .ok_or_else(|| anyhow!("Location response has no country code"))
    }
}

/// The process locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, whichever is set first.
pub fn system_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

pub fn country_from_system_locale() -> Option<String> {
    system_locale().as_deref().and_then(country_from_locale)
}
