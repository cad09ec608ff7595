use crate::api::*;
use crate::schema::common::poll_timestamp;
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio_stream::{self as stream, StreamExt};
use tracing::{debug, error, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// API Documentation: https://www.stockdata.org/documentation
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub static CREATE_QUERY: &str = "
    CREATE TABLE IF NOT EXISTS stock_data (
        id              SERIAL PRIMARY KEY,
        stock_name      TEXT,
        price_usd       DOUBLE PRECISION,
        day_high_usd    DOUBLE PRECISION,
        day_low_usd     DOUBLE PRECISION,
        timestamp       TEXT
    )
";

pub static INSERT_QUERY: &str = "
    INSERT INTO stock_data (stock_name, price_usd, day_high_usd, day_low_usd, timestamp)
    VALUES ($1, $2, $3, $4, $5)
";

pub static SELECT_QUERY: &str = "
    SELECT stock_name, price_usd, day_high_usd, day_low_usd, timestamp
    FROM stock_data
";

const BASE_URL: &str = "https://api.stockdata.org/v1/data/quote";

/// Real-time quotes for a fixed set of tickers from stockdata.org.
pub struct StockDataOrg {
    api_token: String,
    tickers: Vec<String>,
}

impl StockDataOrg {
    pub fn new(api_token: impl Into<String>, tickers: Vec<String>) -> Self {
        Self {
            api_token: api_token.into(),
            tickers,
        }
    }

    pub async fn scrape(&self, pg_client: &mut PgClient) -> anyhow::Result<()> {
        let http_client: HttpClient = reqwest::ClientBuilder::new().build()?;
        self.etl(&http_client, pg_client).await?;
        Ok(())
    }

    fn url(&self) -> String {
        format!(
            "{BASE_URL}?symbols={}&api_token={}",
            self.tickers.join(","),
            self.api_token
        )
    }
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Api<Quotes> for StockDataOrg {
    async fn etl(&self, http_client: &HttpClient, pg_client: &mut PgClient) -> anyhow::Result<()> {
        let timestamp = poll_timestamp();

        trace!("Requesting quotes for {:?} from stockdata.org", self.tickers);
        let quotes = Self::fetch(http_client, &self.url()).await?;
        let rows = quotes.into_rows(&timestamp)?;
        debug!("{} quotes retrieved at {timestamp}", rows.len());

        Self::insert(rows, pg_client, timestamp).await?;
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Http<Quotes> for StockDataOrg {
    async fn fetch(http_client: &HttpClient, url: &String) -> anyhow::Result<Quotes> {
        let response = http_client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                error!("stockdata.org request error: {e}");
                e
            })?
            .bytes()
            .await?;

        match serde_json::from_slice::<Quotes>(&response) {
            Ok(quotes) => Ok(quotes),
            Err(e) => {
                error!("stockdata.org deserialization error: {e}");
                Err(e.into())
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Postgres<Vec<QuoteRow>> for StockDataOrg {
    type Info = String;

    async fn insert(
        data: Vec<QuoteRow>,
        pg_client: &mut PgClient,
        timestamp: Self::Info,
    ) -> anyhow::Result<()> {
        let time = std::time::Instant::now();

        pg_client.batch_execute(CREATE_QUERY).await?;

        // preprocess pg query as transaction
        let query = pg_client.prepare(INSERT_QUERY).await?;
        let transaction = Arc::new(pg_client.transaction().await?);

        let inserted = insert_rows(data, |row| {
            let query = &query;
            let transaction = transaction.clone();
            async move {
                transaction
                    .execute(
                        query,
                        &[
                            &row.stock_name,
                            &row.price_usd,
                            &row.day_high_usd,
                            &row.day_low_usd,
                            &row.timestamp,
                        ],
                    )
                    .await
            }
        })
        .await?;

        // unpack the transaction and commit it to the database
        Arc::into_inner(transaction)
            .ok_or_else(|| anyhow::anyhow!("stock_data transaction still shared"))?
            .commit()
            .await
            .map_err(|e| {
                error!("failed to commit transaction for stock_data at {timestamp}");
                e
            })?;

        debug!(
            "{inserted} stock_data rows inserted for {timestamp}. Elapsed time: {} ms",
            time.elapsed().as_millis()
        );

        Ok(())
    }
}

/// Execute `insert_row` for each row in order and stop at the first failure.
///
/// A failed statement aborts the PostgreSQL transaction and a later COMMIT
/// quietly rolls back, so the error has to reach the caller before any commit.
async fn insert_rows<F, Fut, E>(data: Vec<QuoteRow>, mut insert_row: F) -> anyhow::Result<usize>
where
    F: FnMut(QuoteRow) -> Fut,
    Fut: Future<Output = Result<u64, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut inserted = 0;
    let mut stream = stream::iter(data);
    while let Some(row) = stream.next().await {
        let stock_name = row.stock_name.clone();
        match insert_row(row).await {
            Ok(_) => {
                trace!("quote inserted for [{stock_name}]");
                inserted += 1;
            }
            Err(e) => {
                error!("quote insertion error for [{stock_name}]: {e}");
                return Err(anyhow::Error::new(e)
                    .context(format!("inserting quote for [{stock_name}]")));
            }
        }
    }
    Ok(inserted)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

// Output: one `stock_data` row per ticker per poll
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    pub stock_name: String,
    pub price_usd: f64,
    pub day_high_usd: f64,
    pub day_low_usd: f64,
    pub timestamp: String,
}

// Input: stockdata.org
//
// {
//   "meta": { "requested": 3, "returned": 3 },
//   "data": [
//     { "ticker": "AAPL", "price": 189.84, "day_high": 190.3, "day_low": 187.6, ... },
//     ...
//   ]
// }
#[derive(Deserialize, Debug)]
pub struct Quotes {
    pub data: Option<Vec<Quote>>,
    pub error: Option<QuoteError>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub day_high: f64,
    pub day_low: f64,
}

#[derive(Deserialize, Debug)]
pub struct QuoteError {
    pub code: String,
    pub message: String,
}

impl Quotes {
    /// Stamp every quote of this poll with `timestamp`.
    pub fn into_rows(self, timestamp: &str) -> anyhow::Result<Vec<QuoteRow>> {
        match (self.data, self.error) {
            (_, Some(e)) => Err(anyhow::anyhow!(
                "stockdata.org returned {}: {}",
                e.code,
                e.message
            )),
            (Some(data), None) => Ok(data
                .into_iter()
                .map(|quote| QuoteRow {
                    stock_name: quote.ticker,
                    price_usd: quote.price,
                    day_high_usd: quote.day_high,
                    day_low_usd: quote.day_low,
                    timestamp: timestamp.to_string(),
                })
                .collect()),
            (None, None) => Err(anyhow::anyhow!(
                "stockdata.org response contained no \"data\" array"
            )),
        }
    }
}
