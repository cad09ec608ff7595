use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Raw store rows; timestamps are still text at this point
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// One row of the `stock_data` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawStockRow {
    pub stock_name: String,
    pub price_usd: f64,
    pub day_high_usd: f64,
    pub day_low_usd: f64,
    pub timestamp: String,
}

/// One row of the `exchange_rate` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRateRow {
    pub timestamp: String,
    pub usd_to_target_rate: f64,
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Parsed observations
//
///////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockObservation {
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub price_usd: f64,
    pub day_high_usd: f64,
    pub day_low_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExchangeRateObservation {
    pub timestamp: NaiveDateTime,
    pub usd_to_target_rate: f64,
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Derived frames
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// A stock observation priced in the target currency, rounded to whole units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedPriceRow {
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub ticker: String,
    pub average_price: f64,
}

/// Min, max and latest price of one ticker over a [`Window`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointStats {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

/// Inclusive time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }
}
