use anyhow::Context;
use dotenv::var;
use tracing::trace;

pub const DEFAULT_CURRENCY: &str = "VND";
pub const DEFAULT_TICKERS: [&str; 3] = ["AAPL", "TSLA", "MSFT"];

/// Deployment settings, read from the environment (and `.env`).
///
/// Source credentials are optional here and only required by the job that
/// uses them, so `report` and `serve`-only deployments don't need them all.
#[derive(Debug, Clone)]
pub struct Config {
    pub postgres_url: String,
    pub target_currency: String,
    pub tickers: Vec<String>,
    stockdata_api_token: Option<String>,
    oer_app_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            postgres_url: var("POSTGRES_URL").context("POSTGRES_URL must be set")?,
            target_currency: var("TARGET_CURRENCY")
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            tickers: var("TICKERS")
                .map(|raw| parse_tickers(&raw))
                .unwrap_or_else(|_| DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()),
            stockdata_api_token: var("STOCKDATA_API_TOKEN").ok(),
            oer_app_id: var("OER_APP_ID").ok(),
        };
        trace!(
            "config loaded: currency {}, tickers {:?}",
            config.target_currency,
            config.tickers
        );
        Ok(config)
    }

    pub fn stockdata_api_token(&self) -> anyhow::Result<&str> {
        self.stockdata_api_token
            .as_deref()
            .context("STOCKDATA_API_TOKEN must be set to ingest stock quotes")
    }

    pub fn oer_app_id(&self) -> anyhow::Result<&str> {
        self.oer_app_id
            .as_deref()
            .context("OER_APP_ID must be set to ingest exchange rates")
    }
}

/// Split a comma separated ticker list, uppercased, blanks and repeats removed.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for ticker in raw.split(',').map(|t| t.trim().to_uppercase()) {
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickers_are_cleaned() {
        assert_eq!(
            parse_tickers(" aapl, MSFT,,tsla ,AAPL"),
            vec!["AAPL", "MSFT", "TSLA"]
        );
        assert!(parse_tickers(" , ").is_empty());
    }
}
