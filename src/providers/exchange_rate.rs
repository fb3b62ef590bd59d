use crate::core::currency::{ExchangeRateSource, RateTable, normalize_code};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Client for the `/v4/latest/{BASE}` exchange rate API.
pub struct ExchangeRateApiProvider {
    base_url: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: Option<String>,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl ExchangeRateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable> {
        let base = normalize_code(base);
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("agumiya/1.0")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        if let Some(reported) = data.base.as_deref() {
            if normalize_code(reported) != base {
                return Err(anyhow!(
                    "Rate table base mismatch: asked for {}, got {}",
                    base,
                    reported
                ));
            }
        }

        let table = RateTable::new(&base, data.rates);
        if table.is_empty() {
            return Err(anyhow!("No rates returned for base currency: {}", base));
        }
        debug!(currencies = table.len(), "Received exchange rates");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(base: &str, template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v4/latest/{base}")))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_response = r#"{
            "base": "USD",
            "date": "2026-10-15",
            "rates": { "USD": 1, "EUR": 0.91, "JPY": 148.2, "BAD": 0 }
        }"#;
        let mock_server =
            create_mock_server("USD", ResponseTemplate::new(200).set_body_string(mock_response))
                .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri());
        let table = provider.fetch_rates("usd").await.unwrap();
        assert_eq!(table.base, "USD");
        assert_eq!(table.rate("EUR"), Some(0.91));
        assert_eq!(table.rate("JPY"), Some(148.2));
        assert_eq!(table.rate("USD"), Some(1.0));
        assert!(table.rate("BAD").is_none());
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("USD", ResponseTemplate::new(500)).await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri());
        let result = provider.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for base currency: USD"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string(r#"{"conversion_rates": {}}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri());
        let result = provider.fetch_rates("USD").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USD")
        );
    }

    #[tokio::test]
    async fn test_empty_rates() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string(r#"{"base": "USD", "rates": {"USD": 1}}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri());
        let result = provider.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rates returned for base currency: USD"
        );
    }
}
