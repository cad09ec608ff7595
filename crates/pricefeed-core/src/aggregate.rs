use crate::error::{CoreError, Result};
use crate::model::{DailyAverage, PointStats, UnifiedPriceRow, Window};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily averages
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// Mean price per (calendar date, ticker), ordered by date then ticker.
///
/// Dates are taken from the stored wall-clock timestamps as they are.
pub fn daily_averages(rows: &[UnifiedPriceRow]) -> Vec<DailyAverage> {
    let mut groups: BTreeMap<(NaiveDate, &str), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry((row.timestamp.date(), row.ticker.as_str()))
            .or_insert((0.0, 0));
        entry.0 += row.price;
        entry.1 += 1;
    }

    debug!("grouped {} rows into {} daily buckets", rows.len(), groups.len());

    groups
        .into_iter()
        .map(|((date, ticker), (sum, count))| DailyAverage {
            date,
            ticker: ticker.to_string(),
            average_price: sum / count as f64,
        })
        .collect()
}

/// Keep the daily rows whose ticker is in `tickers`, preserving order.
pub fn filter_tickers<S: AsRef<str>>(daily: &[DailyAverage], tickers: &[S]) -> Vec<DailyAverage> {
    let wanted: HashSet<&str> = tickers.iter().map(AsRef::as_ref).collect();
    daily
        .iter()
        .filter(|row| wanted.contains(row.ticker.as_str()))
        .cloned()
        .collect()
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Point statistics
//
///////////////////////////////////////////////////////////////////////////////////////////////////

/// Min, max and latest price of `ticker` inside `window`.
///
/// When several rows share the latest timestamp the first one in `rows` wins.
pub fn point_stats(rows: &[UnifiedPriceRow], ticker: &str, window: Window) -> Result<PointStats> {
    let mut filtered = rows
        .iter()
        .filter(|row| row.ticker == ticker && window.contains(&row.timestamp));

    let first = filtered.next().ok_or_else(|| CoreError::EmptyWindow {
        ticker: ticker.to_string(),
        start: window.start,
        end: window.end,
    })?;

    let mut stats = PointStats {
        min: first.price,
        max: first.price,
        current: first.price,
    };
    let mut latest = first.timestamp;

    for row in filtered {
        stats.min = stats.min.min(row.price);
        stats.max = stats.max.max(row.price);
        if row.timestamp > latest {
            latest = row.timestamp;
            stats.current = row.price;
        }
    }

    Ok(stats)
}

///////////////////////////////////////////////////////////////////////////////////////////////////
//
// Selection
//
///////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TickerSelection {
    #[default]
    All,
    One(String),
}

impl TickerSelection {
    /// `None`, an empty string and `"All"` (any case) select every ticker.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(s) if s.eq_ignore_ascii_case("all") => Self::All,
            Some(s) => Self::One(normalize_ticker(s)),
        }
    }

    pub fn matches(&self, ticker: &str) -> bool {
        match self {
            Self::All => true,
            Self::One(wanted) => wanted == ticker,
        }
    }
}

/// Tickers are stored uppercase; user input is matched after trimming and uppercasing.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Rows for the selected ticker(s) inside `window`, order preserved.
pub fn select_rows(
    rows: &[UnifiedPriceRow],
    selection: &TickerSelection,
    window: Window,
) -> Vec<UnifiedPriceRow> {
    rows.iter()
        .filter(|row| selection.matches(&row.ticker) && window.contains(&row.timestamp))
        .cloned()
        .collect()
}

/// Distinct tickers in order of first appearance.
pub fn ticker_universe(rows: &[UnifiedPriceRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.ticker.as_str()))
        .map(|row| row.ticker.clone())
        .collect()
}

/// Earliest and latest timestamp present, or `None` for no rows.
pub fn time_bounds(rows: &[UnifiedPriceRow]) -> Option<Window> {
    let start = rows.iter().map(|row| row.timestamp).min()?;
    let end = rows.iter().map(|row| row.timestamp).max()?;
    Some(Window::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn row(ticker: &str, timestamp: NaiveDateTime, price: f64) -> UnifiedPriceRow {
        UnifiedPriceRow {
            timestamp,
            ticker: ticker.to_string(),
            price,
        }
    }

    fn sample() -> Vec<UnifiedPriceRow> {
        vec![
            row("AAPL", at(1, 9), 100.0),
            row("MSFT", at(1, 9), 300.0),
            row("AAPL", at(1, 15), 120.0),
            row("AAPL", at(2, 9), 90.0),
            row("MSFT", at(2, 10), 310.0),
        ]
    }

    #[test]
    fn daily_average_groups_by_date_and_ticker() {
        let daily = daily_averages(&sample());
        let flat: Vec<(u32, &str, f64)> = daily
            .iter()
            .map(|d| (chrono::Datelike::day(&d.date), d.ticker.as_str(), d.average_price))
            .collect();
        assert_eq!(
            flat,
            vec![
                (1, "AAPL", 110.0),
                (1, "MSFT", 300.0),
                (2, "AAPL", 90.0),
                (2, "MSFT", 310.0),
            ]
        );
    }

    #[test]
    fn single_row_day_averages_to_itself() {
        let daily = daily_averages(&[row("TSLA", at(3, 12), 4_567_891.0)]);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].average_price, 4_567_891.0);
    }

    #[test]
    fn filter_by_full_universe_is_identity() {
        let rows = sample();
        let daily = daily_averages(&rows);
        assert_eq!(filter_tickers(&daily, &ticker_universe(&rows)), daily);
    }

    #[test]
    fn filter_by_empty_set_is_empty() {
        let daily = daily_averages(&sample());
        let none: [&str; 0] = [];
        assert!(filter_tickers(&daily, &none).is_empty());
    }

    #[test]
    fn filter_keeps_only_requested() {
        let daily = daily_averages(&sample());
        let only = filter_tickers(&daily, &["MSFT", "NVDA"]);
        assert!(only.iter().all(|d| d.ticker == "MSFT"));
        assert_eq!(only.len(), 2);
    }

    #[test]
    fn point_stats_over_window() {
        let stats = point_stats(&sample(), "AAPL", Window::new(at(1, 0), at(2, 23))).unwrap();
        assert_eq!(
            stats,
            PointStats {
                min: 90.0,
                max: 120.0,
                current: 90.0
            }
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let stats = point_stats(&sample(), "AAPL", Window::new(at(1, 9), at(1, 15))).unwrap();
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 120.0);
        assert_eq!(stats.current, 120.0);
    }

    #[test]
    fn every_value_lies_between_min_and_max() {
        let rows = sample();
        let window = Window::new(at(1, 0), at(2, 23));
        let stats = point_stats(&rows, "MSFT", window).unwrap();
        for r in select_rows(&rows, &TickerSelection::One("MSFT".into()), window) {
            assert!(stats.min <= r.price && r.price <= stats.max);
        }
        assert!(stats.min <= stats.current && stats.current <= stats.max);
    }

    #[test]
    fn empty_window_is_an_error_not_zero() {
        let err = point_stats(&sample(), "AAPL", Window::new(at(3, 0), at(4, 0))).unwrap_err();
        assert!(matches!(err, CoreError::EmptyWindow { ref ticker, .. } if ticker == "AAPL"));

        let err = point_stats(&sample(), "NVDA", Window::new(at(1, 0), at(2, 23))).unwrap_err();
        assert!(matches!(err, CoreError::EmptyWindow { .. }));
    }

    #[test]
    fn latest_tie_keeps_first_row() {
        let rows = vec![
            row("AAPL", at(1, 9), 5.0),
            row("AAPL", at(1, 10), 7.0),
            row("AAPL", at(1, 10), 6.0),
        ];
        let stats = point_stats(&rows, "AAPL", Window::new(at(1, 0), at(1, 23))).unwrap();
        assert_eq!(stats.current, 7.0);
    }

    #[test]
    fn selection_parses_all_and_single() {
        assert_eq!(TickerSelection::parse(None), TickerSelection::All);
        assert_eq!(TickerSelection::parse(Some("ALL")), TickerSelection::All);
        assert_eq!(TickerSelection::parse(Some(" ")), TickerSelection::All);
        assert_eq!(
            TickerSelection::parse(Some("TSLA")),
            TickerSelection::One("TSLA".to_string())
        );
    }

    #[test]
    fn selection_is_case_insensitive() {
        let rows = sample();
        let lower = TickerSelection::parse(Some(" aapl "));
        assert_eq!(lower, TickerSelection::One("AAPL".to_string()));

        let window = time_bounds(&rows).unwrap();
        let picked = select_rows(&rows, &lower, window);
        assert!(!picked.is_empty());
        assert_eq!(
            picked,
            select_rows(&rows, &TickerSelection::parse(Some("AAPL")), window)
        );
        assert_eq!(
            point_stats(&rows, &normalize_ticker("aapl"), window).unwrap(),
            point_stats(&rows, "AAPL", window).unwrap()
        );
    }

    #[test]
    fn select_rows_filters_ticker_and_window() {
        let rows = sample();
        let picked = select_rows(
            &rows,
            &TickerSelection::One("AAPL".into()),
            Window::new(at(1, 10), at(2, 23)),
        );
        let prices: Vec<f64> = picked.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![120.0, 90.0]);

        let all = select_rows(&rows, &TickerSelection::All, time_bounds(&rows).unwrap());
        assert_eq!(all, rows);
    }

    #[test]
    fn universe_and_bounds() {
        let rows = sample();
        assert_eq!(ticker_universe(&rows), vec!["AAPL", "MSFT"]);
        assert_eq!(time_bounds(&rows), Some(Window::new(at(1, 9), at(2, 10))));
        assert_eq!(time_bounds(&[]), None);
    }
}
