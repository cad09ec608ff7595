use chrono::NaiveDateTime;
use pricefeed_core::{
    daily_averages, filter_tickers, normalize_ticker, point_stats, ticker_universe, time_bounds,
    CoreError, UnifiedPriceRow, Window,
};
use std::fmt::Write;

/// What the user asked `report` for; every field falls back to the full data.
#[derive(Debug, Default)]
pub struct ReportOptions {
    pub ticker: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub daily: Option<Vec<String>>,
}

pub fn render(
    rows: &[UnifiedPriceRow],
    options: &ReportOptions,
    currency: &str,
) -> anyhow::Result<String> {
    let mut out = String::new();

    let Some(bounds) = time_bounds(rows) else {
        writeln!(out, "No stock observations stored yet.")?;
        return Ok(out);
    };
    let universe = ticker_universe(rows);

    // point statistics
    let ticker = match &options.ticker {
        Some(ticker) => normalize_ticker(ticker),
        None => universe[0].clone(),
    };
    let window = Window::new(
        options.start.unwrap_or(bounds.start),
        options.end.unwrap_or(bounds.end),
    );

    writeln!(out, "{ticker}  [{} .. {}]", window.start, window.end)?;
    match point_stats(rows, &ticker, window) {
        Ok(stats) => {
            writeln!(out, "  Min Price ({currency}):     {:>16}", thousands(stats.min))?;
            writeln!(out, "  Current Price ({currency}): {:>16}", thousands(stats.current))?;
            writeln!(out, "  Max Price ({currency}):     {:>16}", thousands(stats.max))?;
        }
        Err(CoreError::EmptyWindow { .. }) => {
            writeln!(out, "  no observations in this window")?;
        }
        Err(e) => return Err(e.into()),
    }

    // daily averages
    let daily = daily_averages(rows);
    let daily = match &options.daily {
        Some(tickers) => {
            let tickers: Vec<String> = tickers.iter().map(|t| normalize_ticker(t)).collect();
            filter_tickers(&daily, &tickers)
        }
        None => filter_tickers(&daily, &universe),
    };

    writeln!(out)?;
    writeln!(out, "Average Daily Stock Price ({currency})")?;
    if daily.is_empty() {
        writeln!(out, "  no tickers selected")?;
    }
    for row in &daily {
        writeln!(
            out,
            "  {}  {:<6} {:>16}",
            row.date,
            row.ticker,
            thousands(row.average_price)
        )?;
    }

    Ok(out)
}

/// Whole units with comma thousands separators, e.g. `2,695,000`.
pub fn thousands(value: f64) -> String {
    let whole = value.round_ties_even() as i64;
    let digits = whole.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
