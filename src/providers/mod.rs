pub mod exchange_rate;
pub mod geolocation;

pub use exchange_rate::ExchangeRateApiProvider;
pub use geolocation::IpApiLocator;
