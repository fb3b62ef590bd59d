pub mod cart;
pub mod convert;
pub mod rates;
pub mod session;
pub mod setup;
pub mod ui;

use crate::AppContext;
use crate::providers::geolocation::country_from_system_locale;
use anyhow::Result;

/// Picks the display currency: an explicit code wins, then the configured
/// default, then (only when `detect` is set) the visitor's location.
pub async fn select_currency(
    ctx: &AppContext,
    explicit: Option<&str>,
    detect: bool,
) -> Result<String> {
    if let Some(code) = explicit.or(ctx.config.currency.default.as_deref()) {
        ctx.currency.set_currency(code).await?;
    } else if detect {
        let locale_country = country_from_system_locale();
        ctx.currency.initialize(locale_country.as_deref()).await;
    }
    Ok(ctx.currency.selected_currency().await)
}
