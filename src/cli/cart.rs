use crate::AppContext;
use crate::cart_store::CartStore;
use crate::cli::{select_currency, ui};
use crate::core::cart::{CartLine, LineKey};
use crate::currency_store::CurrencyStore;
use crate::session::{Role, SessionStore};
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum CartCommand {
    Add {
        product_id: String,
        variant_id: Option<String>,
        name: Option<String>,
        price: f64,
        quantity: u32,
    },
    Remove {
        product_id: String,
        variant_id: Option<String>,
    },
    SetQuantity {
        product_id: String,
        variant_id: Option<String>,
        quantity: i64,
    },
    Clear,
    Show {
        currency: Option<String>,
    },
}

/// The explicit user, else whoever is signed in, else the guest cart.
async fn resolve_user(ctx: &AppContext, user: Option<&str>) -> Result<Option<String>> {
    if let Some(user) = user {
        return Ok(Some(user.to_string()));
    }
    let sessions = SessionStore::new(ctx.collection("session")?);
    Ok(sessions.user(Role::User).await.map(|user| user.id))
}

pub async fn run(ctx: &AppContext, user: Option<&str>, command: CartCommand) -> Result<()> {
    let user = resolve_user(ctx, user).await?;
    let cart = CartStore::load(ctx.collection("cart")?, user.as_deref()).await;
    debug!(user = %cart.active_user().await, "Opened cart");

    let currency = match command {
        CartCommand::Add {
            product_id,
            variant_id,
            name,
            price,
            quantity,
        } => {
            if !price.is_finite() || price < 0.0 {
                bail!("Price must be a non-negative number, got {}", price);
            }
            if quantity == 0 {
                bail!("Quantity must be at least 1");
            }
            cart.add(CartLine {
                product_id,
                variant_id,
                name,
                price,
                quantity,
            })
            .await;
            None
        }
        CartCommand::Remove {
            product_id,
            variant_id,
        } => {
            cart.remove(LineKey::new(product_id, variant_id)).await;
            None
        }
        CartCommand::SetQuantity {
            product_id,
            variant_id,
            quantity,
        } => {
            cart.set_quantity(LineKey::new(product_id, variant_id), quantity)
                .await;
            None
        }
        CartCommand::Clear => {
            cart.clear().await;
            None
        }
        CartCommand::Show { currency } => currency,
    };

    let display_currency = select_currency(ctx, currency.as_deref(), false).await?;
    if display_currency != ctx.currency.base_currency() {
        ctx.currency.load_rates().await;
    }
    println!("{}", render_cart(&cart, &ctx.currency).await);
    Ok(())
}

pub async fn render_cart(cart: &CartStore, currency: &CurrencyStore) -> String {
    let user = cart.active_user().await;
    let lines = cart.lines().await;
    let base = currency.base_currency().to_string();

    let mut output = format!(
        "Cart: {}\n\n",
        ui::style_text(&user, ui::StyleType::Title)
    );
    if lines.is_empty() {
        output.push_str(&ui::style_text("Your cart is empty", ui::StyleType::Subtle));
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Product"),
        ui::header_cell("Variant"),
        ui::header_cell("Qty"),
        ui::header_cell("Unit Price"),
        ui::header_cell("Total"),
    ]);
    for line in &lines {
        let label = line.name.as_deref().unwrap_or(&line.product_id);
        let unit = currency.format_price(line.price, &base, false).await;
        let total = currency.format_price(line.line_total(), &base, false).await;
        table.add_row(vec![
            Cell::new(label),
            Cell::new(line.variant_id.as_deref().unwrap_or("-")),
            ui::right_cell(line.quantity),
            ui::right_cell(unit.display),
            ui::right_cell(total.display),
        ]);
    }
    output.push_str(&table.to_string());

    let subtotal = cart.subtotal().await;
    let converted = currency.format_price(subtotal, &base, true).await;
    let total_text = match &converted.original {
        Some(original) => format!("{} ({original})", converted.display),
        None => converted.display.clone(),
    };
    output.push_str(&format!(
        "\n\n{} ({} items): {}",
        ui::style_text("Subtotal", ui::StyleType::TotalLabel),
        cart.item_count().await,
        ui::style_text(&total_text, ui::StyleType::TotalValue)
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::{ExchangeRateSource, LocationProvider, RATE_CACHE_TTL, RateTable};
    use crate::rates::RateFetcher;
    use crate::store::memory::MemoryCollection;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Offline;

    #[async_trait]
    impl ExchangeRateSource for Offline {
        async fn fetch_rates(&self, _base: &str) -> Result<RateTable> {
            Err(anyhow!("offline"))
        }
    }

    #[async_trait]
    impl LocationProvider for Offline {
        async fn detect_country(&self) -> Result<String> {
            Err(anyhow!("offline"))
        }
    }

    fn currency_store() -> CurrencyStore {
        let fetcher = Arc::new(RateFetcher::new(
            Arc::new(Offline),
            Arc::new(MemoryCollection::new()),
            RATE_CACHE_TTL,
        ));
        CurrencyStore::new(fetcher, Arc::new(Offline), "USD")
    }

    #[tokio::test]
    async fn test_render_empty_cart() {
        let cart = CartStore::load(Arc::new(MemoryCollection::new()), None).await;
        let output = console::strip_ansi_codes(&render_cart(&cart, &currency_store()).await)
            .to_string();
        assert!(output.contains("Cart: guest"));
        assert!(output.contains("Your cart is empty"));
    }

    #[tokio::test]
    async fn test_render_cart_in_other_currency() {
        let cart = CartStore::load(Arc::new(MemoryCollection::new()), Some("alice")).await;
        cart.add(CartLine {
            product_id: "tee".to_string(),
            variant_id: Some("m".to_string()),
            name: Some("Logo Tee".to_string()),
            price: 20.0,
            quantity: 2,
        })
        .await;

        let currency = currency_store();
        currency.set_currency("EUR").await.unwrap();
        currency.load_rates().await;

        let output =
            console::strip_ansi_codes(&render_cart(&cart, &currency).await).to_string();
        assert!(output.contains("Logo Tee"));
        assert!(output.contains("18,40 €"));
        assert!(output.contains("36,80 €"));
        assert!(output.contains("(2 items): 36,80 € ($40.00)"));
    }
}
