use crate::schema::{fx, stock};
use pricefeed_core::{RawRateRow, RawStockRow, Snapshot};
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use tracing::{debug, error, warn};

/// Read every row of `stock_data` and `exchange_rate` and parse them into a [`Snapshot`].
///
/// Takes a shared client so pooled connections can be passed straight in.
/// Only SELECTs are issued, so a read-only role is enough. A table the
/// ingestion jobs have not created yet reads as empty.
pub async fn load(pg_client: &tokio_postgres::Client) -> anyhow::Result<Snapshot> {
    let time = std::time::Instant::now();

    let stock_rows = select_all(pg_client, stock::quotes::SELECT_QUERY, "stock_data").await?;
    let rate_rows = select_all(pg_client, fx::rates::SELECT_QUERY, "exchange_rate").await?;

    let raw_stocks: Vec<RawStockRow> = stock_rows.iter().filter_map(stock_row).collect();
    let raw_rates: Vec<RawRateRow> = rate_rows.iter().filter_map(rate_row).collect();

    debug!(
        "loaded {} stock rows and {} rate rows in {} ms",
        raw_stocks.len(),
        raw_rates.len(),
        time.elapsed().as_millis()
    );

    Ok(Snapshot::from_raw(raw_stocks, raw_rates))
}

async fn select_all(
    pg_client: &tokio_postgres::Client,
    query: &str,
    table: &str,
) -> anyhow::Result<Vec<Row>> {
    match pg_client.query(query, &[]).await {
        Ok(rows) => Ok(rows),
        Err(e) if missing_table(e.code()) => {
            debug!("{table} does not exist yet, reading it as empty");
            Ok(Vec::new())
        }
        Err(e) => {
            error!("failed to read {table}: {e}");
            Err(e.into())
        }
    }
}

fn missing_table(code: Option<&SqlState>) -> bool {
    code == Some(&SqlState::UNDEFINED_TABLE)
}

// NULL columns can't be priced; such rows are skipped like malformed timestamps.

fn stock_row(row: &Row) -> Option<RawStockRow> {
    let parsed = (|| -> Result<RawStockRow, tokio_postgres::Error> {
        Ok(RawStockRow {
            stock_name: row.try_get("stock_name")?,
            price_usd: row.try_get("price_usd")?,
            day_high_usd: row.try_get("day_high_usd")?,
            day_low_usd: row.try_get("day_low_usd")?,
            timestamp: row.try_get("timestamp")?,
        })
    })();

    parsed
        .map_err(|e| warn!("dropping stock_data row: {e}"))
        .ok()
}

fn rate_row(row: &Row) -> Option<RawRateRow> {
    let parsed = (|| -> Result<RawRateRow, tokio_postgres::Error> {
        Ok(RawRateRow {
            timestamp: row.try_get("timestamp")?,
            usd_to_target_rate: row.try_get("usd_to_target_rate")?,
        })
    })();

    parsed
        .map_err(|e| warn!("dropping exchange_rate row: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_an_undefined_table_reads_as_empty() {
        assert!(missing_table(Some(&SqlState::UNDEFINED_TABLE)));
        assert!(!missing_table(Some(&SqlState::INSUFFICIENT_PRIVILEGE)));
        assert!(!missing_table(Some(&SqlState::UNDEFINED_COLUMN)));
        assert!(!missing_table(None));
    }

    #[test]
    fn select_queries_are_read_only() {
        for query in [stock::quotes::SELECT_QUERY, fx::rates::SELECT_QUERY] {
            let query = query.trim_start().to_uppercase();
            assert!(query.starts_with("SELECT"));
            assert!(!query.contains("CREATE"));
        }
    }
}
