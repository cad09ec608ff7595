use crate::error::Result;
use crate::join::join;
use crate::model::{
    ExchangeRateObservation, RawRateRow, RawStockRow, StockObservation, UnifiedPriceRow,
};
use crate::time::parse_timestamp;
use tracing::{debug, warn};

/// Every stock and rate observation known at the time it was taken.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub stocks: Vec<StockObservation>,
    pub rates: Vec<ExchangeRateObservation>,
}

impl Snapshot {
    pub fn new(stocks: Vec<StockObservation>, rates: Vec<ExchangeRateObservation>) -> Self {
        Self { stocks, rates }
    }

    /// Parse raw table rows; rows with an unreadable timestamp are logged and dropped.
    pub fn from_raw(raw_stocks: Vec<RawStockRow>, raw_rates: Vec<RawRateRow>) -> Self {
        let stock_count = raw_stocks.len();
        let rate_count = raw_rates.len();

        let stocks: Vec<StockObservation> = raw_stocks
            .into_iter()
            .filter_map(|raw| match parse_timestamp(&raw.timestamp) {
                Ok(timestamp) => Some(StockObservation {
                    timestamp,
                    ticker: raw.stock_name,
                    price_usd: raw.price_usd,
                    day_high_usd: raw.day_high_usd,
                    day_low_usd: raw.day_low_usd,
                }),
                Err(e) => {
                    warn!("dropping stock_data row for [{}]: {e}", raw.stock_name);
                    None
                }
            })
            .collect();

        let rates: Vec<ExchangeRateObservation> = raw_rates
            .into_iter()
            .filter_map(|raw| match parse_timestamp(&raw.timestamp) {
                Ok(timestamp) => Some(ExchangeRateObservation {
                    timestamp,
                    usd_to_target_rate: raw.usd_to_target_rate,
                }),
                Err(e) => {
                    warn!("dropping exchange_rate row: {e}");
                    None
                }
            })
            .collect();

        debug!(
            "snapshot built: {}/{} stock rows, {}/{} rate rows",
            stocks.len(),
            stock_count,
            rates.len(),
            rate_count
        );

        Self { stocks, rates }
    }

    /// Join the snapshot into the unified price series.
    pub fn unified(&self) -> Result<Vec<UnifiedPriceRow>> {
        join(&self.stocks, &self.rates)
    }
}
