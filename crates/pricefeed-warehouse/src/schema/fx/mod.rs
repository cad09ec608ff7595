pub mod rates;

pub use rates::OpenExchangeRates;
