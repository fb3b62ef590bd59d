//! Display currency state shared by everything that renders prices.

use crate::core::catalog::{self, currency_for_country, fallback_table};
use crate::core::convert::convert;
use crate::core::currency::{LocationProvider, RateTable, normalize_code};
use crate::core::format::{FormattedPrice, format_price};
use crate::rates::{RateFetcher, RateLookup, RateOrigin};
use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CurrencySnapshot {
    pub currency: String,
    pub rates: Option<Arc<RateTable>>,
    pub loading: bool,
    pub error: Option<String>,
}

struct CurrencyState {
    selected: String,
    chosen_by_user: bool,
    rates: Option<Arc<RateTable>>,
    loading: bool,
    error: Option<String>,
}

pub struct CurrencyStore {
    fetcher: Arc<RateFetcher>,
    locator: Arc<dyn LocationProvider>,
    base_currency: String,
    state: RwLock<CurrencyState>,
}

impl CurrencyStore {
    pub fn new(
        fetcher: Arc<RateFetcher>,
        locator: Arc<dyn LocationProvider>,
        base_currency: &str,
    ) -> Self {
        let base_currency = normalize_code(base_currency);
        Self {
            fetcher,
            locator,
            state: RwLock::new(CurrencyState {
                selected: base_currency.clone(),
                chosen_by_user: false,
                rates: None,
                loading: false,
                error: None,
            }),
            base_currency,
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Detects the visitor's currency and loads rates, concurrently. A currency
    /// the user already picked is kept.
    pub async fn initialize(&self, locale_country: Option<&str>) -> CurrencySnapshot {
        self.state.write().await.loading = true;
        let (detected, lookup) = futures::join!(
            self.detect_currency(locale_country),
            self.fetcher.get_rates(&self.base_currency)
        );

        {
            let mut state = self.state.write().await;
            if !state.chosen_by_user {
                info!(currency = %detected, "Using detected currency");
                state.selected = detected;
            }
        }
        self.apply_lookup(lookup).await;
        self.snapshot().await
    }

    /// IP lookup first, then the locale's country, then the base currency.
    pub async fn detect_currency(&self, locale_country: Option<&str>) -> String {
        let country = match self.locator.detect_country().await {
            Ok(country) => Some(country),
            Err(e) => {
                warn!(error = %e, "Location lookup failed, falling back to locale");
                locale_country.map(str::to_string)
            }
        };
        debug!(?country, "Resolved visitor country");
        country
            .as_deref()
            .and_then(currency_for_country)
            .map_or_else(|| self.base_currency.clone(), str::to_string)
    }

    pub async fn selected_currency(&self) -> String {
        self.state.read().await.selected.clone()
    }

    pub async fn set_currency(&self, code: &str) -> Result<()> {
        let code = normalize_code(code);
        if !catalog::is_supported(&code) {
            bail!("Unsupported currency: {}", code);
        }
        let mut state = self.state.write().await;
        state.selected = code;
        state.chosen_by_user = true;
        Ok(())
    }

    /// Returns loaded rates, fetching them through the cache on first use.
    pub async fn load_rates(&self) -> Arc<RateTable> {
        if let Some(rates) = self.state.read().await.rates.clone() {
            return rates;
        }
        self.state.write().await.loading = true;
        let lookup = self.fetcher.get_rates(&self.base_currency).await;
        self.apply_lookup(lookup).await
    }

    pub async fn refresh_rates(&self) -> Arc<RateTable> {
        self.state.write().await.loading = true;
        let lookup = self.fetcher.refresh(&self.base_currency).await;
        self.apply_lookup(lookup).await
    }

    async fn apply_lookup(&self, lookup: RateLookup) -> Arc<RateTable> {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = match lookup.origin {
            RateOrigin::Fallback => {
                Some("Live exchange rates unavailable, showing approximate prices".to_string())
            }
            RateOrigin::Cache | RateOrigin::Live => None,
        };
        state.rates = Some(Arc::clone(&lookup.table));
        lookup.table
    }

    async fn current_table(&self) -> Arc<RateTable> {
        match self.state.read().await.rates.clone() {
            Some(rates) => rates,
            None => Arc::new(fallback_table(&self.base_currency)),
        }
    }

    /// Converts into the selected currency. Uses the static table until rates load.
    pub async fn convert(&self, amount: f64, from: &str) -> f64 {
        let to = self.selected_currency().await;
        convert(amount, from, &to, &*self.current_table().await)
    }

    pub async fn format_price(
        &self,
        amount: f64,
        from: &str,
        show_original: bool,
    ) -> FormattedPrice {
        let to = self.selected_currency().await;
        format_price(amount, from, &to, &*self.current_table().await, show_original)
    }

    pub async fn snapshot(&self) -> CurrencySnapshot {
        let state = self.state.read().await;
        CurrencySnapshot {
            currency: state.selected.clone(),
            rates: state.rates.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn supported_currencies(&self) -> Vec<&'static str> {
        catalog::supported_currencies().collect()
    }

    /// Refreshes rates every `every` until the returned handle is aborted.
    pub fn spawn_periodic_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                debug!("Periodic rate refresh");
                self.refresh_rates().await;
            }
        })
    }
}
