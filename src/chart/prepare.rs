use log::debug;

use crate::error::ChartError;
use crate::series::{Bar, Column, PriceTable, OHLCV_FIELDS};

/// Validate a table for plotting and extract its complete numeric rows.
///
/// Every OHLCV column must exist as a single-level column. Cells that do not
/// coerce to a finite number count as missing and drop their whole row.
pub fn prepare_ohlcv(table: &PriceTable) -> Result<Vec<Bar>, ChartError> {
    if table.is_empty() {
        return Err(ChartError::EmptyTable);
    }

    let mut columns: Vec<&Column> = Vec::with_capacity(OHLCV_FIELDS.len());
    let mut missing = Vec::new();
    for field in OHLCV_FIELDS {
        match table.column(field) {
            Some(column) => columns.push(column),
            None => missing.push(field.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(ChartError::MissingColumns {
            missing,
            available: table.column_names(),
        });
    }

    let numeric: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|column| column.cells.iter().map(|cell| cell.to_f64()).collect())
        .collect();

    let bars: Vec<Bar> = table
        .index()
        .iter()
        .enumerate()
        .filter_map(|(row, timestamp)| {
            Some(Bar {
                timestamp: *timestamp,
                open: numeric[0][row]?,
                high: numeric[1][row]?,
                low: numeric[2][row]?,
                close: numeric[3][row]?,
                volume: numeric[4][row]?,
            })
        })
        .collect();

    let dropped = table.len() - bars.len();
    if dropped > 0 {
        debug!("dropped {} incomplete rows before plotting", dropped);
    }

    if bars.is_empty() {
        return Err(ChartError::NoValidRows);
    }
    Ok(bars)
}
