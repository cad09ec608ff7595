use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true)]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the given sources once and append the results to PostgreSQL.
    Ingest {
        #[arg(required = true)]
        datasets: Vec<Dataset>,
    },

    /// Keep polling on schedule: quotes hourly, the exchange rate daily at 05:00.
    Serve,

    /// Print point statistics and daily averages from the stored data.
    Report {
        /// Ticker for min/max/current; defaults to the first one stored.
        #[arg(long)]
        ticker: Option<String>,

        /// Window start, e.g. "2024-06-03T09:00"; defaults to the earliest observation.
        #[arg(long)]
        start: Option<String>,

        /// Window end (inclusive); defaults to the latest observation.
        #[arg(long)]
        end: Option<String>,

        /// Tickers for the daily averages; defaults to every stored ticker.
        #[arg(long, value_delimiter = ',')]
        daily: Option<Vec<String>>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dataset {
    /// stockdata.org quotes -> stock_data
    StockQuotes,
    /// openexchangerates.org USD rate -> exchange_rate
    ExchangeRates,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingest_and_report() {
        let cli = Cli::parse_from(["pricefeed", "ingest", "stock-quotes", "exchange-rates"]);
        match cli.command {
            Commands::Ingest { datasets } => {
                assert_eq!(datasets, vec![Dataset::StockQuotes, Dataset::ExchangeRates])
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from([
            "pricefeed",
            "--trace",
            "DEBUG",
            "report",
            "--ticker",
            "AAPL",
            "--daily",
            "AAPL,MSFT",
        ]);
        assert_eq!(cli.trace, TraceLevel::DEBUG);
        match cli.command {
            Commands::Report { ticker, daily, start, .. } => {
                assert_eq!(ticker.as_deref(), Some("AAPL"));
                assert_eq!(daily, Some(vec!["AAPL".to_string(), "MSFT".to_string()]));
                assert!(start.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ingest_needs_a_dataset() {
        assert!(Cli::try_parse_from(["pricefeed", "ingest"]).is_err());
    }
}
