//! Cart lines and the reducer that mutates them.

use crate::core::convert::round_to;
use serde::{Deserialize, Serialize};

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: String,
    pub variant_id: Option<String>,
}

impl LineKey {
    pub fn new(product_id: impl Into<String>, variant_id: Option<String>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id,
        }
    }
}

/// One product and variant in the cart. `price` is the unit price in the
/// store's base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    pub quantity: u32,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.variant_id == key.variant_id
    }

    pub fn line_total(&self) -> f64 {
        round_to(self.price * f64::from(self.quantity), 2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    Add(CartLine),
    Remove(LineKey),
    SetQuantity(LineKey, i64),
    Clear,
}

pub fn reduce(lines: &mut Vec<CartLine>, action: CartAction) {
    match action {
        CartAction::Add(line) => {
            if line.quantity == 0 {
                return;
            }
            match lines.iter_mut().find(|existing| existing.matches(&line.key())) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }
        CartAction::Remove(key) => lines.retain(|line| !line.matches(&key)),
        CartAction::SetQuantity(key, quantity) => {
            if quantity <= 0 {
                lines.retain(|line| !line.matches(&key));
            } else if let Some(line) = lines.iter_mut().find(|line| line.matches(&key)) {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
        }
        CartAction::Clear => lines.clear(),
    }
}

pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

pub fn subtotal(lines: &[CartLine]) -> f64 {
    round_to(lines.iter().map(CartLine::line_total).sum(), 2)
}
