use crate::error::{CoreError, Result};
use crate::model::{ExchangeRateObservation, StockObservation, UnifiedPriceRow};
use chrono::NaiveDateTime;
use tracing::{debug, trace};

/// Price every stock observation in the target currency using the exchange
/// rate observed nearest in time.
///
/// Neither input needs to be sorted. The output holds one row per stock
/// observation, ordered by timestamp. Equidistant rates resolve to the
/// earlier one.
pub fn join(
    stocks: &[StockObservation],
    rates: &[ExchangeRateObservation],
) -> Result<Vec<UnifiedPriceRow>> {
    if rates.is_empty() {
        return Err(CoreError::EmptyRateSeries);
    }

    let mut rates = rates.to_vec();
    rates.sort_by_key(|rate| rate.timestamp);

    let mut stocks: Vec<&StockObservation> = stocks.iter().collect();
    stocks.sort_by_key(|stock| stock.timestamp);

    let rows: Vec<UnifiedPriceRow> = stocks
        .into_iter()
        .map(|stock| {
            let rate = nearest(&rates, stock.timestamp);
            trace!(
                "[{}] {} matched rate {} at {}",
                stock.ticker,
                stock.timestamp,
                rate.usd_to_target_rate,
                rate.timestamp
            );
            UnifiedPriceRow {
                timestamp: stock.timestamp,
                ticker: stock.ticker.clone(),
                price: convert(stock.price_usd, rate.usd_to_target_rate),
            }
        })
        .collect();

    debug!("joined {} stock rows against {} rates", rows.len(), rates.len());
    Ok(rows)
}

/// `price_usd × rate`, rounded to whole units of the target currency (ties to even).
pub fn convert(price_usd: f64, rate: f64) -> f64 {
    (price_usd * rate).round_ties_even()
}

/// `rates` must be sorted by timestamp and non-empty.
fn nearest(rates: &[ExchangeRateObservation], at: NaiveDateTime) -> &ExchangeRateObservation {
    // first rate strictly after `at`; everything before it is at or before `at`
    let split = rates.partition_point(|rate| rate.timestamp <= at);

    match (split.checked_sub(1).map(|i| &rates[i]), rates.get(split)) {
        (Some(before), Some(after)) => {
            let back = at - before.timestamp;
            let forward = after.timestamp - at;
            if back <= forward {
                before
            } else {
                after
            }
        }
        (Some(before), None) => before,
        (None, Some(after)) => after,
        (None, None) => unreachable!("nearest() called with an empty rate series"),
    }
}
