//! Static per-currency data: display rules, approximate fallback rates and the
//! country to currency mapping.
//!
//! The fallback rates are USD based and go stale. They only exist so that a
//! price can still be shown when the live rate API is unreachable.

use crate::core::currency::{DEFAULT_BASE_CURRENCY, RateTable, normalize_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// 1,234,567
    Thousands,
    /// 12,34,567
    Indian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPlacement {
    Prefix,
    PrefixSpaced,
    Suffix,
}

#[derive(Debug, Clone, Copy)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u32,
    pub grouping: Grouping,
    pub group_separator: &'static str,
    pub decimal_separator: &'static str,
    pub placement: SymbolPlacement,
    pub fallback_rate: f64,
}

const fn western(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    decimals: u32,
    fallback_rate: f64,
) -> CurrencyInfo {
    CurrencyInfo {
        code,
        name,
        symbol,
        decimals,
        grouping: Grouping::Thousands,
        group_separator: ",",
        decimal_separator: ".",
        placement: SymbolPlacement::Prefix,
        fallback_rate,
    }
}

pub static CURRENCIES: &[CurrencyInfo] = &[
    western("USD", "US Dollar", "$", 2, 1.0),
    CurrencyInfo {
        group_separator: ".",
        decimal_separator: ",",
        placement: SymbolPlacement::Suffix,
        ..western("EUR", "Euro", "€", 2, 0.92)
    },
    western("GBP", "British Pound", "£", 2, 0.79),
    western("JPY", "Japanese Yen", "¥", 0, 149.5),
    western("KRW", "South Korean Won", "₩", 0, 1330.0),
    CurrencyInfo {
        grouping: Grouping::Indian,
        ..western("INR", "Indian Rupee", "₹", 2, 83.2)
    },
    western("CNY", "Chinese Yuan", "CN¥", 2, 7.24),
    western("AUD", "Australian Dollar", "A$", 2, 1.52),
    western("CAD", "Canadian Dollar", "CA$", 2, 1.36),
    CurrencyInfo {
        group_separator: "’",
        placement: SymbolPlacement::PrefixSpaced,
        ..western("CHF", "Swiss Franc", "CHF", 2, 0.88)
    },
    western("SGD", "Singapore Dollar", "S$", 2, 1.34),
    CurrencyInfo {
        placement: SymbolPlacement::PrefixSpaced,
        ..western("AED", "UAE Dirham", "AED", 2, 3.67)
    },
    western("NZD", "New Zealand Dollar", "NZ$", 2, 1.64),
    western("HKD", "Hong Kong Dollar", "HK$", 2, 7.82),
    CurrencyInfo {
        group_separator: " ",
        decimal_separator: ",",
        placement: SymbolPlacement::Suffix,
        ..western("SEK", "Swedish Krona", "kr", 2, 10.5)
    },
    western("MXN", "Mexican Peso", "MX$", 2, 17.1),
    CurrencyInfo {
        group_separator: ".",
        decimal_separator: ",",
        placement: SymbolPlacement::PrefixSpaced,
        ..western("BRL", "Brazilian Real", "R$", 2, 4.97)
    },
];

static EUROZONE: &[&str] = &[
    "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU", "LV",
    "MT", "NL", "PT", "SI", "SK",
];

static COUNTRY_CURRENCIES: &[(&str, &str)] = &[
    ("US", "USD"),
    ("GB", "GBP"),
    ("JP", "JPY"),
    ("KR", "KRW"),
    ("IN", "INR"),
    ("CN", "CNY"),
    ("AU", "AUD"),
    ("CA", "CAD"),
    ("CH", "CHF"),
    ("LI", "CHF"),
    ("SG", "SGD"),
    ("AE", "AED"),
    ("NZ", "NZD"),
    ("HK", "HKD"),
    ("SE", "SEK"),
    ("MX", "MXN"),
    ("BR", "BRL"),
];

pub fn currency_info(code: &str) -> Option<&'static CurrencyInfo> {
    let code = normalize_code(code);
    CURRENCIES.iter().find(|info| info.code == code)
}

pub fn is_supported(code: &str) -> bool {
    currency_info(code).is_some()
}

pub fn supported_currencies() -> impl Iterator<Item = &'static str> {
    CURRENCIES.iter().map(|info| info.code)
}

/// USD-relative fallback rate for a single currency.
pub fn fallback_rate(code: &str) -> Option<f64> {
    currency_info(code).map(|info| info.fallback_rate)
}

/// The static table expressed relative to `base`. Unknown bases get the USD
/// table, which converts correctly since conversion only uses rate ratios.
pub fn fallback_table(base: &str) -> RateTable {
    let usd = RateTable::new(
        DEFAULT_BASE_CURRENCY,
        CURRENCIES.iter().map(|info| (info.code, info.fallback_rate)),
    );
    usd.rebase(base).unwrap_or(usd)
}

/// Maps a country code to its currency, or `None` if it isn't one we sell in.
pub fn currency_for_country(country: &str) -> Option<&'static str> {
    let country = normalize_code(country);
    if EUROZONE.contains(&country.as_str()) {
        return Some("EUR");
    }
    COUNTRY_CURRENCIES
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, currency)| *currency)
}

/// Extracts the region from a POSIX or BCP 47 locale, e.g. `en_IN.UTF-8` or `de-DE`.
pub fn country_from_locale(locale: &str) -> Option<String> {
    let tag = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    let region = tag.split(['_', '-']).nth(1)?;
    (region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| region.to_ascii_uppercase())
}
