use crate::api::*;
use crate::schema::common::poll_timestamp;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, trace};

//////////////////////////////////////////////////////////////////////////////////////
//
// API Documentation: https://docs.openexchangerates.org/reference/latest-json
//
//////////////////////////////////////////////////////////////////////////////////////

pub static CREATE_QUERY: &str = "
    CREATE TABLE IF NOT EXISTS exchange_rate (
        id                  SERIAL PRIMARY KEY,
        timestamp           TEXT,
        usd_to_target_rate  DOUBLE PRECISION
    )
";

pub static INSERT_QUERY: &str = "
    INSERT INTO exchange_rate (timestamp, usd_to_target_rate) VALUES ($1, $2)
";

pub static SELECT_QUERY: &str = "
    SELECT timestamp, usd_to_target_rate FROM exchange_rate
";

const BASE_URL: &str = "https://openexchangerates.org/api/latest.json";

/// Latest USD rate for one target currency from openexchangerates.org.
pub struct OpenExchangeRates {
    app_id: String,
    currency: String,
}

impl OpenExchangeRates {
    pub fn new(app_id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            currency: currency.into(),
        }
    }

    pub async fn scrape(&self, pg_client: &mut PgClient) -> anyhow::Result<()> {
        let http_client: HttpClient = reqwest::ClientBuilder::new().build()?;
        self.etl(&http_client, pg_client).await?;
        Ok(())
    }

    fn url(&self) -> String {
        format!("{BASE_URL}?app_id={}", self.app_id)
    }
}

#[async_trait]
impl Api<Latest> for OpenExchangeRates {
    async fn etl(&self, http_client: &HttpClient, pg_client: &mut PgClient) -> anyhow::Result<()> {
        let timestamp = poll_timestamp();

        trace!("Requesting USD/{} on openexchangerates.org", self.currency);
        let latest = Self::fetch(http_client, &self.url()).await?;
        let rate = latest.rate(&self.currency)?;
        debug!("USD/{} = {rate} at {timestamp}", self.currency);

        Self::insert(rate, pg_client, timestamp).await?;
        Ok(())
    }
}

//////////////////////////////////////////////////////////////////////////////////////

#[async_trait]
impl Http<Latest> for OpenExchangeRates {
    async fn fetch(http_client: &HttpClient, url: &String) -> anyhow::Result<Latest> {
        Ok(http_client.get(url).send().await?.json().await?)
    }
}

//////////////////////////////////////////////////////////////////////////////////////

#[async_trait]
impl Postgres<f64> for OpenExchangeRates {
    type Info = String;

    async fn insert(rate: f64, pg_client: &mut PgClient, timestamp: Self::Info) -> anyhow::Result<()> {
        pg_client.batch_execute(CREATE_QUERY).await?;

        let query = pg_client.prepare(INSERT_QUERY).await?;
        let transaction = pg_client.transaction().await?;

        transaction
            .execute(&query, &[&timestamp, &rate])
            .await
            .map_err(|e| {
                error!("error inserting exchange rate [{timestamp}, {rate}]: {e}");
                e
            })?;

        match transaction.commit().await {
            Ok(_) => debug!("committed transaction for exchange_rate"),
            Err(e) => {
                error!("error committing transaction for exchange_rate: {:?}", e);
                return Err(e.into());
            }
        }

        Ok(())
    }
}

//////////////////////////////////////////////////////////////////////////////////////

// {
//   "timestamp": 1717387200,
//   "base": "USD",
//   "rates": { "EUR": 0.92, "VND": 25455.0, ... }
// }
#[derive(Debug, Deserialize)]
pub struct Latest {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    pub message: Option<String>,
}

impl Latest {
    pub fn rate(&self, currency: &str) -> anyhow::Result<f64> {
        match self.rates.get(currency) {
            Some(rate) => Ok(*rate),
            None => match &self.message {
                Some(message) => Err(anyhow::anyhow!("openexchangerates.org error: {message}")),
                None => Err(anyhow::anyhow!("no USD/{currency} rate in response")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_target_currency() {
        let body = r#"{
            "disclaimer": "Usage subject to terms",
            "timestamp": 1717387200,
            "base": "USD",
            "rates": {"EUR": 0.92, "VND": 25455.0}
        }"#;
        let latest: Latest = serde_json::from_str(body).unwrap();
        assert_eq!(latest.rate("VND").unwrap(), 25455.0);
        assert!(latest.rate("XYZ").is_err());
    }

    #[test]
    fn error_body_is_reported() {
        let body = r#"{"error": true, "status": 401, "message": "invalid_app_id", "description": "Invalid App ID"}"#;
        let latest: Latest = serde_json::from_str(body).unwrap();
        let err = latest.rate("VND").unwrap_err();
        assert!(err.to_string().contains("invalid_app_id"));
    }

    #[test]
    fn url_carries_app_id() {
        let source = OpenExchangeRates::new("abc", "VND");
        assert_eq!(
            source.url(),
            "https://openexchangerates.org/api/latest.json?app_id=abc"
        );
    }
}
