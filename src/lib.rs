pub mod cart_store;
pub mod cli;
pub mod core;
pub mod currency_store;
pub mod providers;
pub mod rates;
pub mod session;
pub mod store;

use crate::cli::cart::CartCommand;
use crate::core::cache::{KeyValueCollection, Store};
use crate::core::config::AppConfig;
use crate::currency_store::CurrencyStore;
use crate::providers::{ExchangeRateApiProvider, IpApiLocator};
use crate::rates::RateFetcher;
use crate::session::{Role, SessionUser};
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rates {
        base: Option<String>,
    },
    Convert {
        amount: f64,
        from: String,
        to: Option<String>,
        show_original: bool,
    },
    Detect,
    Currencies,
    Watch {
        to: Option<String>,
    },
    Cart {
        user: Option<String>,
        command: CartCommand,
    },
    Login {
        role: Role,
        user: SessionUser,
        token: String,
    },
    Logout {
        role: Role,
    },
}

/// Everything a command needs, wired from the config.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<KeyValueStore>,
    pub fetcher: Arc<RateFetcher>,
    pub currency: Arc<CurrencyStore>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        let store = Arc::new(KeyValueStore::open(&data_path.join("cache")));
        Self::with_store(config, store)
    }

    pub fn with_store(config: AppConfig, store: Arc<KeyValueStore>) -> Result<Self> {
        let rate_cache = store
            .get_collection("currency", true, true)
            .context("Failed to open rate cache")?;
        let source = Arc::new(ExchangeRateApiProvider::new(
            config.providers.exchange_rate_url(),
        ));
        let fetcher = Arc::new(RateFetcher::new(
            source,
            rate_cache,
            config.currency.cache_ttl(),
        ));
        let locator = Arc::new(IpApiLocator::new(config.providers.geolocation_url()));
        let currency = Arc::new(CurrencyStore::new(
            Arc::clone(&fetcher),
            locator,
            &config.currency.base,
        ));

        Ok(Self {
            config,
            store,
            fetcher,
            currency,
        })
    }

    pub fn collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
        self.store
            .get_collection(name, true, true)
            .with_context(|| format!("Failed to open {name} storage"))
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Storefront starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ctx = AppContext::new(config)?;
    let result = match command {
        AppCommand::Rates { base } => cli::rates::run(&ctx, base.as_deref()).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            show_original,
        } => cli::convert::run(&ctx, amount, &from, to.as_deref(), show_original).await,
        AppCommand::Detect => cli::convert::detect(&ctx).await,
        AppCommand::Currencies => {
            cli::rates::list_currencies(&ctx);
            Ok(())
        }
        AppCommand::Watch { to } => cli::rates::watch(&ctx, to.as_deref()).await,
        AppCommand::Cart { user, command } => cli::cart::run(&ctx, user.as_deref(), command).await,
        AppCommand::Login { role, user, token } => {
            cli::session::login(&ctx, role, &user, &token).await
        }
        AppCommand::Logout { role } => cli::session::logout(&ctx, role).await,
    };
    ctx.store.persist();
    result
}
