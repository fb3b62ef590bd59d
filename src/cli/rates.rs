use crate::AppContext;
use crate::cli::{select_currency, ui};
use crate::core::catalog;
use crate::core::currency::normalize_code;
use crate::rates::{RateLookup, RateOrigin};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use comfy_table::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run(ctx: &AppContext, base: Option<&str>) -> Result<()> {
    let base = normalize_code(base.unwrap_or(&ctx.config.currency.base));
    if !catalog::is_supported(&base) {
        bail!("Unsupported currency: {}", base);
    }

    let pb = ui::new_spinner("Fetching exchange rates...");
    let lookup = ctx.fetcher.get_rates(&base).await;
    pb.finish_and_clear();

    println!("{}", render_rates(&lookup));
    Ok(())
}

pub fn render_rates(lookup: &RateLookup) -> String {
    let table_data = &lookup.table;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", table_data.base)),
    ]);

    for (code, rate) in &table_data.rates {
        let name = catalog::currency_info(code).map_or("", |info| info.name);
        table.add_row(vec![
            Cell::new(code),
            Cell::new(name),
            ui::right_cell(format!("{rate:.4}")),
        ]);
    }

    let source = match lookup.origin {
        RateOrigin::Live => ui::style_text("live", ui::StyleType::TotalValue),
        RateOrigin::Cache => ui::style_text("cached", ui::StyleType::Subtle),
        RateOrigin::Fallback => ui::style_text(
            "fallback (approximate, may be out of date)",
            ui::StyleType::Warning,
        ),
    };

    format!(
        "Exchange rates: {}\n\n{}\n\nSource: {} as of {}",
        ui::style_text(&table_data.base, ui::StyleType::Title),
        table,
        source,
        lookup.fetched_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Prints the display currency's rate after every periodic refresh until Ctrl-C.
pub async fn watch(ctx: &AppContext, to: Option<&str>) -> Result<()> {
    let every = ctx.config.currency.refresh_interval();
    if every.is_zero() {
        bail!("currency.refresh_interval_secs must be greater than zero");
    }

    let currency = select_currency(ctx, to, true).await?;
    ctx.currency.load_rates().await;
    print_rate(ctx, &currency).await;

    let refresher = Arc::clone(&ctx.currency).spawn_periodic_refresh(every);
    info!(every_secs = every.as_secs(), "Watching exchange rates");
    // Offset so each report lands after the refresh it follows.
    let start = tokio::time::Instant::now() + every + Duration::from_secs(1);
    let mut ticker = tokio::time::interval_at(start, every);
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => print_rate(ctx, &currency).await,
            signal = tokio::signal::ctrl_c() => {
                break signal.context("Failed to listen for Ctrl-C");
            }
        }
    };
    refresher.abort();
    result
}

async fn print_rate(ctx: &AppContext, currency: &str) {
    let snapshot = ctx.currency.snapshot().await;
    let base = ctx.currency.base_currency();
    let rate = snapshot
        .rates
        .as_ref()
        .and_then(|table| table.rate(currency))
        .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.4}"));
    let mut line = format!(
        "{} 1 {base} = {} {currency}",
        ui::style_text(&Utc::now().format("%H:%M:%S").to_string(), ui::StyleType::Subtle),
        ui::style_text(&rate, ui::StyleType::TotalValue)
    );
    if let Some(error) = snapshot.error {
        line.push_str(&format!(" {}", ui::style_text(&error, ui::StyleType::Warning)));
    }
    println!("{line}");
}

pub fn list_currencies(ctx: &AppContext) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Symbol"),
        ui::header_cell("Decimals"),
    ]);
    let infos = ctx
        .currency
        .supported_currencies()
        .into_iter()
        .filter_map(catalog::currency_info);
    for info in infos {
        table.add_row(vec![
            Cell::new(info.code),
            Cell::new(info.name),
            Cell::new(info.symbol),
            ui::right_cell(info.decimals),
        ]);
    }
    println!("{table}");
}
