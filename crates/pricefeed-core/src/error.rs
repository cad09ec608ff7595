use chrono::NaiveDateTime;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// No exchange rate has been recorded, so no stock price can be converted.
    #[error("exchange rate series is empty; join is undefined")]
    EmptyRateSeries,

    /// The ticker has no observation inside the requested window.
    #[error("no observations for {ticker} between {start} and {end}")]
    EmptyWindow {
        ticker: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("malformed timestamp: {0:?}")]
    MalformedTimestamp(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
