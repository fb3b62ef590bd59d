//! Exchange rate lookup with a TTL cache and a static fallback.

use crate::core::cache::{KeyValueCollection, get_json, put_json};
use crate::core::catalog::fallback_table;
use crate::core::currency::{
    CachedRates, ExchangeRateSource, RateTable, is_fresh, normalize_code,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const CACHE_KEY_PREFIX: &str = "currency_rates_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOrigin {
    Cache,
    Live,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RateLookup {
    pub table: Arc<RateTable>,
    pub origin: RateOrigin,
    pub fetched_at: DateTime<Utc>,
}

struct MemoEntry {
    table: Arc<RateTable>,
    fetched_at: DateTime<Utc>,
    fallback: bool,
}

impl MemoEntry {
    fn lookup(&self) -> RateLookup {
        RateLookup {
            table: Arc::clone(&self.table),
            origin: if self.fallback {
                RateOrigin::Fallback
            } else {
                RateOrigin::Cache
            },
            fetched_at: self.fetched_at,
        }
    }
}

/// Resolves rate tables for a base currency. Never fails: when the source is
/// down or returns junk, the static fallback table is served and cached.
/// Cached fallback data keeps reporting [`RateOrigin::Fallback`].
pub struct RateFetcher {
    source: Arc<dyn ExchangeRateSource>,
    cache: Arc<dyn KeyValueCollection>,
    ttl: Duration,
    memo: Mutex<HashMap<String, MemoEntry>>,
}

impl RateFetcher {
    pub fn new(
        source: Arc<dyn ExchangeRateSource>,
        cache: Arc<dyn KeyValueCollection>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            memo: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(base: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{base}")
    }

    /// Returns a fresh cached table if there is one, fetching otherwise.
    #[instrument(skip(self))]
    pub async fn get_rates(&self, base: &str) -> RateLookup {
        self.load(&normalize_code(base), false).await
    }

    /// Fetches from the source regardless of what is cached.
    #[instrument(skip(self))]
    pub async fn refresh(&self, base: &str) -> RateLookup {
        self.load(&normalize_code(base), true).await
    }

    async fn load(&self, base: &str, force: bool) -> RateLookup {
        // Held across the fetch so concurrent callers share one request.
        let mut memo = self.memo.lock().await;
        let now = Utc::now();

        if !force {
            if let Some(entry) = memo.get(base) {
                if is_fresh(entry.fetched_at, now, self.ttl) {
                    debug!(base, fallback = entry.fallback, "Rate memo hit");
                    return entry.lookup();
                }
            }

            // Entries are keyed by the requested base. A fallback table for a
            // base outside the catalog is USD based and still valid here.
            if let Some(cached) =
                get_json::<CachedRates>(self.cache.as_ref(), &Self::cache_key(base)).await
            {
                if cached.is_fresh(now, self.ttl) {
                    debug!(base, fallback = cached.fallback, "Rate cache hit");
                    let entry = MemoEntry {
                        table: Arc::new(cached.table),
                        fetched_at: cached.fetched_at,
                        fallback: cached.fallback,
                    };
                    let lookup = entry.lookup();
                    memo.insert(base.to_string(), entry);
                    return lookup;
                }
                debug!(base, fetched_at = %cached.fetched_at, "Ignoring stale cached rates");
            }
        }

        let (table, origin) = match self.source.fetch_rates(base).await {
            Ok(table) if !table.is_empty() => (table, RateOrigin::Live),
            Ok(_) => {
                warn!(base, "Rate source returned no rates, using fallback table");
                (fallback_table(base), RateOrigin::Fallback)
            }
            Err(e) => {
                warn!(base, error = %e, "Rate fetch failed, using fallback table");
                (fallback_table(base), RateOrigin::Fallback)
            }
        };

        let fallback = origin == RateOrigin::Fallback;
        let cached = CachedRates {
            table,
            fetched_at: now,
            fallback,
        };
        if let Err(e) = put_json(self.cache.as_ref(), &Self::cache_key(base), &cached, None).await
        {
            warn!(base, error = %e, "Failed to cache rates");
        }

        let table = Arc::new(cached.table);
        memo.insert(
            base.to_string(),
            MemoEntry {
                table: Arc::clone(&table),
                fetched_at: now,
                fallback,
            },
        );
        RateLookup {
            table,
            origin,
            fetched_at: now,
        }
    }
}
