use crate::AppContext;
use crate::cli::{select_currency, ui};
use crate::core::format::FormattedPrice;
use crate::providers::geolocation::{country_from_system_locale, system_locale};
use anyhow::{Result, bail};

pub async fn run(
    ctx: &AppContext,
    amount: f64,
    from: &str,
    to: Option<&str>,
    show_original: bool,
) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("Amount must be a non-negative number, got {}", amount);
    }

    select_currency(ctx, to, true).await?;
    let pb = ui::new_spinner("Loading exchange rates...");
    ctx.currency.load_rates().await;
    pb.finish_and_clear();

    let price = ctx.currency.format_price(amount, from, show_original).await;
    println!("{}", render_price(&price));
    if let Some(error) = ctx.currency.snapshot().await.error {
        println!("{}", ui::style_text(&error, ui::StyleType::Warning));
    }
    Ok(())
}

pub fn render_price(price: &FormattedPrice) -> String {
    let display = ui::style_text(&price.display, ui::StyleType::TotalValue);
    match &price.original {
        Some(original) => format!(
            "{display} {}",
            ui::style_text(&format!("(was {original})"), ui::StyleType::Subtle)
        ),
        None => display,
    }
}

pub async fn detect(ctx: &AppContext) -> Result<()> {
    let locale = system_locale();
    let currency = ctx
        .currency
        .detect_currency(country_from_system_locale().as_deref())
        .await;
    println!(
        "Detected currency: {} {}",
        ui::style_text(&currency, ui::StyleType::TotalValue),
        ui::style_text(
            &format!("(locale: {})", locale.as_deref().unwrap_or("unset")),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}
