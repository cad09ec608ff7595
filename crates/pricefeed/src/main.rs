use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use dotenv::dotenv;
use pricefeed_core::parse_timestamp;
use pricefeed_warehouse::{
    self as warehouse,
    api::connect,
    schedule::{run_job, RetryPolicy, Schedule},
    schema::{fx::OpenExchangeRates, stock::StockDataOrg},
    Config,
};
use report::ReportOptions;
use tracing::{debug, error, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod report;

fn preprocess(trace_level: Level) -> Result<()> {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::TRACE => Level::TRACE,
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level)?;
    trace!("Command line input recorded: {cli:#?}");

    let config = Config::from_env()?;
    debug!("Target currency: {}", config.target_currency);

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> pricefeed <COMMAND>"
    match &cli.command {
        // "> pricefeed ingest [stock-quotes exchange-rates]"
        // poll each source once
        Ingest { datasets } => {
            use cli::Dataset::*;

            let mut pg_client = connect(&config.postgres_url).await?;
            let mut failed = 0;

            for dataset in datasets {
                match dataset {
                    StockQuotes => {
                        info!("Ingesting stock quotes for {:?}", config.tickers);
                        match ingest_stock_quotes(&config, &mut pg_client).await {
                            Ok(_) => trace!("Stock quotes inserted successfully"),
                            Err(e) => {
                                error!("Stock quotes ingestion failed: {e}");
                                failed += 1;
                            }
                        }
                    }

                    // ---------------------------------------------------------------------------
                    ExchangeRates => {
                        info!("Ingesting USD/{} exchange rate", config.target_currency);
                        match ingest_exchange_rate(&config, &mut pg_client).await {
                            Ok(_) => trace!("Exchange rate inserted successfully"),
                            Err(e) => {
                                error!("Exchange rate ingestion failed: {e}");
                                failed += 1;
                            }
                        }
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{failed} of {} datasets failed to ingest", datasets.len());
            }
        }

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> pricefeed serve"
        // the two ETL jobs on their own schedules, each retried on failure
        Serve => {
            // fail fast on missing credentials rather than at the first tick
            config.stockdata_api_token()?;
            config.oer_app_id()?;

            let stocks = run_job(
                "stock_data_etl",
                Schedule::STOCK_QUOTES,
                RetryPolicy::default(),
                || {
                    let config = config.clone();
                    async move {
                        let mut pg_client = connect(&config.postgres_url).await?;
                        ingest_stock_quotes(&config, &mut pg_client).await
                    }
                },
            );

            let rates = run_job(
                "exchange_rate_etl",
                Schedule::EXCHANGE_RATE,
                RetryPolicy::default(),
                || {
                    let config = config.clone();
                    async move {
                        let mut pg_client = connect(&config.postgres_url).await?;
                        ingest_exchange_rate(&config, &mut pg_client).await
                    }
                },
            );

            tokio::select! {
                _ = stocks => {},
                _ = rates => {},
                _ = tokio::signal::ctrl_c() => info!("Shutting down scheduled jobs"),
            }
        }

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> pricefeed report [--ticker T] [--start TS] [--end TS] [--daily A,B]"
        // recompute everything from a fresh snapshot
        Report {
            ticker,
            start,
            end,
            daily,
        } => {
            let options = ReportOptions {
                ticker: ticker.clone(),
                start: start.as_deref().map(parse_timestamp).transpose()?,
                end: end.as_deref().map(parse_timestamp).transpose()?,
                daily: daily.clone(),
            };

            let pg_client = connect(&config.postgres_url).await?;
            let snapshot = warehouse::snapshot::load(&pg_client).await?;
            let rows = snapshot.unified()?;
            debug!("{} unified price rows", rows.len());

            print!("{}", report::render(&rows, &options, &config.target_currency)?);
        }
    }

    Ok(())
}

async fn ingest_stock_quotes(
    config: &Config,
    pg_client: &mut warehouse::api::PgClient,
) -> Result<()> {
    let source = StockDataOrg::new(config.stockdata_api_token()?, config.tickers.clone());
    source.scrape(pg_client).await
}

async fn ingest_exchange_rate(
    config: &Config,
    pg_client: &mut warehouse::api::PgClient,
) -> Result<()> {
    let source = OpenExchangeRates::new(config.oer_app_id()?, config.target_currency.clone());
    source.scrape(pg_client).await
}
