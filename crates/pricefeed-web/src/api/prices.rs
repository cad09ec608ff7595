use actix_web::{get, web, HttpResponse, Responder};
use deadpool_postgres::{Object, Pool};
use pricefeed_core::time::format_timestamp;
use pricefeed_core::{
    daily_averages, filter_tickers, normalize_ticker, parse_timestamp, point_stats, select_rows,
    ticker_universe, time_bounds, CoreError, TickerSelection, UnifiedPriceRow, Window,
};
use pricefeed_warehouse::config::parse_tickers;
use pricefeed_warehouse::snapshot;
use serde::{Deserialize, Serialize};
use serde_json::json;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Every request recomputes from a fresh snapshot of both tables.
//
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn unified_rows(db_pool: &Pool) -> Result<Vec<UnifiedPriceRow>, HttpResponse> {
    let conn: Object = db_pool.get().await.map_err(|e| {
        log::error!("failed to get connection from pool: {e}");
        HttpResponse::ServiceUnavailable().body("Database unavailable")
    })?;

    let snapshot = snapshot::load(&conn).await.map_err(|e| {
        log::error!("snapshot load failed: {e}");
        HttpResponse::InternalServerError().body("Query execution failed")
    })?;

    snapshot.unified().map_err(error_response)
}

fn error_response(e: CoreError) -> HttpResponse {
    let body = json!({ "error": e.to_string() });
    match e {
        CoreError::EmptyRateSeries => HttpResponse::ServiceUnavailable().json(body),
        CoreError::EmptyWindow { .. } => HttpResponse::NotFound().json(body),
        CoreError::MalformedTimestamp(_) => HttpResponse::BadRequest().json(body),
    }
}

/// Window from the query, each missing end taken from the data's own bounds.
///
/// `Ok(None)` when an end is missing and there is no data to take it from.
fn resolve_window(
    rows: &[UnifiedPriceRow],
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<Window>, CoreError> {
    let start = start.map(parse_timestamp).transpose()?;
    let end = end.map(parse_timestamp).transpose()?;
    let bounds = time_bounds(rows);

    let start = start.or(bounds.map(|b| b.start));
    let end = end.or(bounds.map(|b| b.end));
    Ok(start.zip(end).map(|(start, end)| Window::new(start, end)))
}

// Same layout the ingestion jobs store, so advertised bounds parse back to the exact instant.
fn iso(timestamp: &chrono::NaiveDateTime) -> String {
    format_timestamp(timestamp)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Ticker universe and the time range covered by the stored data
///
/// ```json
/// {
///     "tickers": ["AAPL", "TSLA", "MSFT"],
///     "start": "2024-06-03T10:00:00.000000",
///     "end": "2024-06-05T16:00:00.000000"
/// }
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct TickerIndex {
    tickers: Vec<String>,
    start: Option<String>,
    end: Option<String>,
}

#[utoipa::path(
    get,
    path = "/tickers",
    responses(
        (
            status = 200, description = "Every ticker present in the stored quotes, with the earliest and latest observation",
            body = TickerIndex, content_type = "application/json",
            example = json!({
                "tickers": ["AAPL", "TSLA", "MSFT"],
                "start": "2024-06-03T10:00:00.000000",
                "end": "2024-06-05T16:00:00.000000"
            })
        ),
        (status = 503, description = "No exchange rate stored yet")
    )
)]
#[get("tickers")]
pub async fn tickers(db_pool: web::Data<Pool>) -> impl Responder {
    let rows = match unified_rows(&db_pool).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let bounds = time_bounds(&rows);
    HttpResponse::Ok().json(TickerIndex {
        tickers: ticker_universe(&rows),
        start: bounds.map(|b| iso(&b.start)),
        end: bounds.map(|b| iso(&b.end)),
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Stock prices converted to the target currency
///
/// ```json
/// [
///     {
///         "timestamp": "2024-06-03T10:00:00.000000",
///         "ticker": "AAPL",
///         "price": 2400000.0
///     },
///     // ...
/// ]
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct PriceRow {
    timestamp: String,
    ticker: String,
    price: f64,
}

#[derive(Deserialize, Debug)]
pub struct PriceQuery {
    ticker: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[utoipa::path(
    get,
    path = "/prices",
    responses(
        (
            status = 200, description = "Every stock observation priced with the nearest exchange rate, rounded to whole units",
            body = [PriceRow], content_type = "application/json",
            example = json!([
                {
                    "timestamp": "2024-06-03T10:00:00.000000",
                    "ticker": "AAPL",
                    "price": 2400000.0
                }
            ])
        ),
        (status = 400, description = "Malformed start or end timestamp"),
        (status = 503, description = "No exchange rate stored yet")
    ),
    params(
        ("ticker" = Option<String>, Query, description = "Stock ticker symbol, or \"All\""),
        ("start" = Option<String>, Query, description = "Inclusive window start; defaults to the earliest observation"),
        ("end" = Option<String>, Query, description = "Inclusive window end; defaults to the latest observation")
    )
)]
#[get("prices")]
pub async fn prices(query: web::Query<PriceQuery>, db_pool: web::Data<Pool>) -> impl Responder {
    let rows = match unified_rows(&db_pool).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let window = match resolve_window(&rows, query.start.as_deref(), query.end.as_deref()) {
        Ok(Some(window)) => window,
        Ok(None) => return HttpResponse::Ok().json(Vec::<PriceRow>::new()),
        Err(e) => return error_response(e),
    };
    let selection = TickerSelection::parse(query.ticker.as_deref());

    let data: Vec<PriceRow> = select_rows(&rows, &selection, window)
        .into_iter()
        .map(|row| PriceRow {
            timestamp: iso(&row.timestamp),
            ticker: row.ticker,
            price: row.price,
        })
        .collect();

    HttpResponse::Ok().json(data)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Average daily price per ticker
///
/// ```json
/// [
///     {
///         "date": "2024-06-03",
///         "ticker": "AAPL",
///         "average_price": 2547500.0
///     },
///     // ...
/// ]
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct DailyPrice {
    date: String,
    ticker: String,
    average_price: f64,
}

#[derive(Deserialize, Debug)]
pub struct DailyQuery {
    tickers: Option<String>,
}

#[utoipa::path(
    get,
    path = "/prices/daily",
    responses(
        (
            status = 200, description = "Daily average price of each selected ticker",
            body = [DailyPrice], content_type = "application/json",
            example = json!([
                {
                    "date": "2024-06-03",
                    "ticker": "AAPL",
                    "average_price": 2547500.0
                }
            ])
        ),
        (status = 503, description = "No exchange rate stored yet")
    ),
    params(
        ("tickers" = Option<String>, Query, description = "Comma separated tickers; absent selects all, empty selects none")
    )
)]
#[get("prices/daily")]
pub async fn daily(query: web::Query<DailyQuery>, db_pool: web::Data<Pool>) -> impl Responder {
    let rows = match unified_rows(&db_pool).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let selected = match &query.tickers {
        Some(raw) => parse_tickers(raw),
        None => ticker_universe(&rows),
    };

    let data: Vec<DailyPrice> = filter_tickers(&daily_averages(&rows), &selected)
        .into_iter()
        .map(|row| DailyPrice {
            date: row.date.to_string(),
            ticker: row.ticker,
            average_price: row.average_price,
        })
        .collect();

    HttpResponse::Ok().json(data)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Min, max and latest price of one ticker over a window
///
/// ```json
/// {
///     "ticker": "AAPL",
///     "start": "2024-06-03T10:00:00.000000",
///     "end": "2024-06-05T16:00:00.000000",
///     "min": 2400000.0,
///     "max": 2695000.0,
///     "current": 2695000.0
/// }
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct PriceStats {
    ticker: String,
    start: String,
    end: String,
    min: f64,
    max: f64,
    current: f64,
}

#[derive(Deserialize, Debug)]
pub struct WindowQuery {
    start: Option<String>,
    end: Option<String>,
}

#[utoipa::path(
    get,
    path = "/prices/{ticker}/stats",
    responses(
        (
            status = 200, description = "Point statistics for the ticker inside the inclusive window",
            body = PriceStats, content_type = "application/json",
            example = json!({
                "ticker": "AAPL",
                "start": "2024-06-03T10:00:00.000000",
                "end": "2024-06-05T16:00:00.000000",
                "min": 2400000.0,
                "max": 2695000.0,
                "current": 2695000.0
            })
        ),
        (status = 400, description = "Malformed start or end timestamp"),
        (status = 404, description = "No observations for the ticker inside the window"),
        (status = 503, description = "No exchange rate stored yet")
    ),
    params(
        ("ticker", description = "Stock ticker symbol"),
        ("start" = Option<String>, Query, description = "Inclusive window start; defaults to the earliest observation"),
        ("end" = Option<String>, Query, description = "Inclusive window end; defaults to the latest observation")
    )
)]
#[get("prices/{ticker}/stats")]
pub async fn stats(
    path: web::Path<String>,
    query: web::Query<WindowQuery>,
    db_pool: web::Data<Pool>,
) -> impl Responder {
    let ticker = normalize_ticker(&path.into_inner());
    let rows = match unified_rows(&db_pool).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let window = match resolve_window(&rows, query.start.as_deref(), query.end.as_deref()) {
        Ok(Some(window)) => window,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "error": format!("no observations for {ticker}") }))
        }
        Err(e) => return error_response(e),
    };

    match point_stats(&rows, &ticker, window) {
        Ok(point) => HttpResponse::Ok().json(PriceStats {
            ticker,
            start: iso(&window.start),
            end: iso(&window.end),
            min: point.min,
            max: point.max,
            current: point.current,
        }),
        Err(e) => error_response(e),
    }
}
