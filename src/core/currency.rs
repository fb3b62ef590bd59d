//! Currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const RATE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Multipliers relative to `base`. The base itself is always 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Builds a table, dropping entries that are not positive and finite.
    pub fn new<I, S>(base: &str, rates: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let base = normalize_code(base);
        let mut rates: BTreeMap<String, f64> = rates
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .map(|(code, rate)| (normalize_code(code.as_ref()), rate))
            .collect();
        rates.insert(base.clone(), 1.0);
        Self { base, rates }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&normalize_code(code)).copied()
    }

    /// Number of currencies besides the base.
    pub fn len(&self) -> usize {
        self.rates.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-expresses the table relative to another currency it contains.
    pub fn rebase(&self, base: &str) -> Option<RateTable> {
        let pivot = self.rate(base)?;
        Some(RateTable::new(
            base,
            self.rates.iter().map(|(code, rate)| (code, rate / pivot)),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRates {
    pub table: RateTable,
    pub fetched_at: DateTime<Utc>,
    /// Set when `table` is the static fallback rather than live data.
    #[serde(default)]
    pub fallback: bool,
}

impl CachedRates {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_fresh(self.fetched_at, now, ttl)
    }
}

/// `0 <= now - fetched_at < ttl`. Timestamps in the future are treated as stale.
pub fn is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let age = now.signed_duration_since(fetched_at);
    age >= chrono::Duration::zero() && chrono::Duration::from_std(ttl).map_or(true, |ttl| age < ttl)
}

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable>;
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns an ISO 3166 alpha-2 country code.
    async fn detect_country(&self) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_drops_invalid_rates_and_pins_base() {
        let table = RateTable::new(
            "usd",
            vec![
                ("eur", 0.9),
                ("GBP", -1.0),
                ("JPY", f64::NAN),
                ("USD", 3.0),
            ],
        );
        assert_eq!(table.base, "USD");
        assert_eq!(table.rate("EUR"), Some(0.9));
        assert_eq!(table.rate("USD"), Some(1.0));
        assert!(table.rate("GBP").is_none());
        assert!(table.rate("JPY").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rebase() {
        let table = RateTable::new("USD", vec![("EUR", 0.5), ("GBP", 0.25)]);
        let rebased = table.rebase("EUR").unwrap();
        assert_eq!(rebased.base, "EUR");
        assert_eq!(rebased.rate("USD"), Some(2.0));
        assert_eq!(rebased.rate("GBP"), Some(0.5));
        assert!(table.rebase("XYZ").is_none());
    }

    #[test]
    fn test_cached_rates_freshness() {
        let now = Utc::now();
        let mut cached = CachedRates {
            table: RateTable::new("USD", Vec::<(String, f64)>::new()),
            fetched_at: now,
            fallback: false,
        };

        cached.fetched_at = now - chrono::Duration::minutes(59);
        assert!(cached.is_fresh(now, RATE_CACHE_TTL));

        cached.fetched_at = now - chrono::Duration::minutes(60);
        assert!(!cached.is_fresh(now, RATE_CACHE_TTL));

        cached.fetched_at = now + chrono::Duration::minutes(5);
        assert!(!cached.is_fresh(now, RATE_CACHE_TTL));
    }

    #[test]
    fn test_cached_rates_without_fallback_flag_reads_as_live() {
        let json = r#"{"table":{"base":"USD","rates":{"USD":1.0,"EUR":0.9}},"fetched_at":"2026-10-15T10:00:00Z"}"#;
        let cached: CachedRates = serde_json::from_str(json).unwrap();
        assert!(!cached.fallback);
        assert_eq!(cached.table.rate("EUR"), Some(0.9));
    }
}
