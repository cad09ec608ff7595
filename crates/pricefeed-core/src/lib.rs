//! Asof-join and aggregation over two independently sampled series: stock
//! quotes in USD and a USD exchange rate.
//!
//! Everything here is pure and synchronous. Callers build a [`Snapshot`] from
//! the raw store rows, join it into [`UnifiedPriceRow`]s and derive daily
//! averages or point statistics from those.

pub mod aggregate;
pub mod error;
pub mod join;
pub mod model;
pub mod snapshot;
pub mod time;

pub use crate::aggregate::{
    daily_averages, filter_tickers, normalize_ticker, point_stats, select_rows, ticker_universe,
    time_bounds, TickerSelection,
};
pub use crate::error::{CoreError, Result};
pub use crate::join::join;
pub use crate::model::{
    DailyAverage, ExchangeRateObservation, PointStats, RawRateRow, RawStockRow,
    StockObservation, UnifiedPriceRow, Window,
};
pub use crate::snapshot::Snapshot;
pub use crate::time::parse_timestamp;
