use crate::core::catalog;
use crate::core::currency::{RateTable, normalize_code};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds half away from zero. Values outside the decimal range pass through.
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn lookup_rate(code: &str, table: &RateTable) -> f64 {
    table
        .rate(code)
        .or_else(|| {
            let rate = catalog::fallback_rate(code)?;
            let base = catalog::fallback_rate(&table.base)?;
            Some(rate / base)
        })
        .unwrap_or(1.0)
}

/// Converts `amount` from one currency to another through `table`.
///
/// Equal codes return the amount untouched. Otherwise the result is rounded to
/// two decimal places. Currencies missing from `table` use the static fallback
/// rate, and 1.0 when the catalog doesn't know them either.
pub fn convert(amount: f64, from: &str, to: &str, table: &RateTable) -> f64 {
    let from = normalize_code(from);
    let to = normalize_code(to);
    if from == to {
        return amount;
    }
    round_to(amount / lookup_rate(&from, table) * lookup_rate(&to, table), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_table() -> RateTable {
        RateTable::new("USD", vec![("EUR", 0.9), ("GBP", 0.8), ("JPY", 150.0)])
    }

    #[test]
    fn test_identity_is_exact() {
        let table = usd_table();
        for amount in [0.0, 0.005, 19.999, 1234.5678] {
            assert_eq!(convert(amount, "EUR", "eur", &table), amount);
            assert_eq!(convert(amount, "XYZ", "XYZ", &table), amount);
        }
    }

    #[test]
    fn test_from_base_multiplies_and_rounds() {
        let table = usd_table();
        assert_eq!(convert(100.0, "USD", "EUR", &table), round_to(100.0 * 0.9, 2));
        assert_eq!(convert(10.0, "USD", "JPY", &table), 1500.0);
        assert_eq!(convert(1.239, "USD", "EUR", &table), 1.12);
    }

    #[test]
    fn test_cross_rate() {
        let table = usd_table();
        assert_eq!(convert(90.0, "EUR", "GBP", &table), 80.0);
        assert_eq!(convert(1500.0, "JPY", "USD", &table), 10.0);
    }

    #[test]
    fn test_missing_rate_uses_static_table() {
        let table = RateTable::new("USD", vec![("EUR", 0.9)]);
        assert_eq!(
            convert(100.0, "USD", "INR", &table),
            round_to(100.0 * catalog::fallback_rate("INR").unwrap(), 2)
        );
    }

    #[test]
    fn test_unknown_currency_is_one_to_one() {
        let table = usd_table();
        assert_eq!(convert(42.0, "USD", "XYZ", &table), 42.0);
        assert_eq!(convert(42.0, "XYZ", "EUR", &table), 37.8);
    }

    #[test]
    fn test_round_to_half_away_from_zero() {
        assert_eq!(round_to(2.3456, 2), 2.35);
        assert_eq!(round_to(-2.3456, 2), -2.35);
        assert_eq!(round_to(1234.5, 0), 1235.0);
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }
}
