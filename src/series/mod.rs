//! Time-indexed price tables and the numeric bars extracted from them.

use chrono::{DateTime, Utc};

pub mod cell;
mod display;
pub mod table;

pub use cell::Cell;
pub use table::{Column, ColumnKey, PriceTable};

/// The five fields every bar carries, in the order they are rendered.
pub const OHLCV_FIELDS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// A fully numeric OHLCV row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}
