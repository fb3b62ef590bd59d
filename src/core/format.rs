//! Locale-style price rendering.

use crate::core::catalog::{self, CurrencyInfo, Grouping, SymbolPlacement};
use crate::core::convert::{convert, round_to};
use crate::core::currency::{RateTable, normalize_code};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedPrice {
    pub amount: f64,
    pub currency: String,
    pub display: String,
    /// The unconverted amount, when requested and the currencies differ.
    pub original: Option<String>,
}

fn group_digits(digits: &str, grouping: Grouping, separator: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = chars.len();
    let mut size = 3;
    while end > size {
        groups.push(chars[end - size..end].iter().collect());
        end -= size;
        if grouping == Grouping::Indian {
            size = 2;
        }
    }
    groups.push(chars[..end].iter().collect());
    groups.reverse();
    groups.join(separator)
}

fn render_number(amount: f64, info: &CurrencyInfo) -> String {
    let rounded = round_to(amount.abs(), info.decimals);
    let fixed = format!("{:.*}", info.decimals as usize, rounded);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };
    let mut out = group_digits(int_part, info.grouping, info.group_separator);
    if let Some(frac) = frac_part {
        out.push_str(info.decimal_separator);
        out.push_str(frac);
    }
    out
}

fn generic_info() -> CurrencyInfo {
    CurrencyInfo {
        code: "",
        name: "",
        symbol: "",
        decimals: 2,
        grouping: Grouping::Thousands,
        group_separator: ",",
        decimal_separator: ".",
        placement: SymbolPlacement::PrefixSpaced,
        fallback_rate: 1.0,
    }
}

/// Formats an amount in `currency`, e.g. `$1,234.56`, `1.234,56 €` or `¥1,235`.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let code = normalize_code(currency);
    let generic;
    let (info, symbol) = match catalog::currency_info(&code) {
        Some(info) => (info, info.symbol),
        None => {
            generic = generic_info();
            (&generic, code.as_str())
        }
    };

    let number = render_number(amount, info);
    let negative = amount < 0.0 && round_to(amount.abs(), info.decimals) > 0.0;
    let sign = if negative { "-" } else { "" };
    match info.placement {
        SymbolPlacement::Prefix => format!("{sign}{symbol}{number}"),
        SymbolPlacement::PrefixSpaced => format!("{sign}{symbol} {number}"),
        SymbolPlacement::Suffix => format!("{sign}{number} {symbol}"),
    }
}

/// Converts and formats a price, optionally keeping the source-currency
/// rendering alongside.
pub fn format_price(
    amount: f64,
    from: &str,
    to: &str,
    table: &RateTable,
    show_original: bool,
) -> FormattedPrice {
    let converted = convert(amount, from, to, table);
    let original = (show_original && normalize_code(from) != normalize_code(to))
        .then(|| format_amount(amount, from));
    FormattedPrice {
        amount: converted,
        currency: normalize_code(to),
        display: format_amount(converted, to),
        original,
    }
}
