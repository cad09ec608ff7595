use chrono::{NaiveDate, NaiveDateTime};
use pricefeed_core::{
    daily_averages, filter_tickers, point_stats, ticker_universe, time_bounds, CoreError,
    RawRateRow, RawStockRow, Snapshot, Window,
};

fn raw_stock(name: &str, price_usd: f64, timestamp: &str) -> RawStockRow {
    RawStockRow {
        stock_name: name.to_string(),
        price_usd,
        day_high_usd: price_usd * 1.01,
        day_low_usd: price_usd * 0.99,
        timestamp: timestamp.to_string(),
    }
}

fn raw_rate(usd_to_target_rate: f64, timestamp: &str) -> RawRateRow {
    RawRateRow {
        timestamp: timestamp.to_string(),
        usd_to_target_rate,
    }
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

#[test]
fn hourly_polls_against_sparse_rates() {
    let snapshot = Snapshot::from_raw(
        vec![
            raw_stock("AAPL", 100.0, "2024-06-03T10:00:00"),
            raw_stock("AAPL", 110.0, "2024-06-03T11:00:00"),
        ],
        vec![
            raw_rate(24000.0, "2024-06-03T09:55:00"),
            raw_rate(24500.0, "2024-06-03T11:05:00"),
        ],
    );

    let rows = snapshot.unified().unwrap();
    let flat: Vec<(NaiveDateTime, f64)> = rows.iter().map(|r| (r.timestamp, r.price)).collect();
    assert_eq!(
        flat,
        vec![(at(3, 10, 0), 2_400_000.0), (at(3, 11, 0), 2_695_000.0)]
    );
}

#[test]
fn no_rates_means_no_output() {
    let snapshot = Snapshot::from_raw(vec![raw_stock("AAPL", 100.0, "2024-06-03T10:00:00")], vec![]);
    assert_eq!(snapshot.unified(), Err(CoreError::EmptyRateSeries));
}

#[test]
fn dashboard_flow() {
    // three tickers polled hourly over two days, one rate per morning
    let mut stocks = Vec::new();
    for day in [3, 4] {
        for hour in 14..17 {
            let ts = format!("2024-06-0{day}T{hour}:00:00.000000");
            stocks.push(raw_stock("AAPL", 190.0 + hour as f64, &ts));
            stocks.push(raw_stock("TSLA", 170.0 + day as f64, &ts));
            stocks.push(raw_stock("MSFT", 420.0, &ts));
        }
    }
    let rates = vec![
        raw_rate(25_000.0, "2024-06-03T05:00:00.000000"),
        raw_rate(25_400.0, "2024-06-04T05:00:00.000000"),
    ];

    let rows = Snapshot::from_raw(stocks.clone(), rates).unified().unwrap();
    assert_eq!(rows.len(), stocks.len());
    assert_eq!(ticker_universe(&rows), vec!["AAPL", "TSLA", "MSFT"]);

    let bounds = time_bounds(&rows).unwrap();
    assert_eq!(bounds, Window::new(at(3, 14, 0), at(4, 16, 0)));

    // 14:00 on the 4th is 9h after the 4th's rate and 33h after the 3rd's
    let stats = point_stats(&rows, "AAPL", bounds).unwrap();
    assert_eq!(stats.min, 204.0 * 25_000.0);
    assert_eq!(stats.max, 206.0 * 25_400.0);
    assert_eq!(stats.current, 206.0 * 25_400.0);

    let daily = daily_averages(&rows);
    assert_eq!(daily.len(), 6);
    let tsla_day_one = daily
        .iter()
        .find(|d| d.ticker == "TSLA" && d.date == at(3, 0, 0).date())
        .unwrap();
    assert_eq!(tsla_day_one.average_price, 173.0 * 25_000.0);

    assert_eq!(filter_tickers(&daily, &ticker_universe(&rows)), daily);
    assert_eq!(filter_tickers(&daily, &["MSFT"]).len(), 2);

    let err = point_stats(&rows, "AAPL", Window::new(at(5, 0, 0), at(6, 0, 0))).unwrap_err();
    assert!(matches!(err, CoreError::EmptyWindow { .. }));
}
