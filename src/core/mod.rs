//! Core business logic: rate tables, conversion, formatting and the cart reducer

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod currency;
pub mod format;
pub mod log;

// Re-export main types for cleaner imports
pub use cart::{CartAction, CartLine, LineKey};
pub use currency::{CachedRates, ExchangeRateSource, LocationProvider, RateTable};
pub use format::FormattedPrice;
