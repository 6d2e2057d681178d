use chrono::NaiveDate;
use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }
}

/// Failures while talking to the market-data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a usable response (connection, TLS, status).
    #[error("transport error for {symbol}: {message}")]
    Transport { symbol: String, message: String },
    /// The provider answered, but with an API-level error or a payload we cannot decode.
    #[error("provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },
    #[error("no data found for {}", symbols.join(", "))]
    NoData { symbols: Vec<String> },
}

impl FetchError {
    pub fn transport(symbol: &str, message: impl Into<String>) -> Self {
        FetchError::Transport {
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }

    pub fn provider(symbol: &str, message: impl Into<String>) -> Self {
        FetchError::Provider {
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData { .. })
    }
}

/// Invalid parameters for a history download.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("at least one symbol is required")]
    NoSymbols,
    #[error("invalid date `{input}`, expected YYYY-MM-DD")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unknown interval `{0}`")]
    UnknownInterval(String),
    #[error("start date {start} must be before end date {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column `{column}` has {actual} cells but the index has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Reasons a candlestick chart was not produced.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No data to plot.")]
    EmptyTable,
    #[error(
        "Missing one or more required columns for plotting: {}. Available columns: [{}]",
        missing.join(", "),
        available.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("No valid rows left to plot after cleaning.")]
    NoValidRows,
    #[error("failed to render chart: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
