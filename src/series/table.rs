use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::TableError;

use super::{Bar, Cell, OHLCV_FIELDS};

/// Column header. Combined multi-symbol tables carry the symbol as a second level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub field: String,
    pub symbol: Option<String>,
}

impl ColumnKey {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            symbol: None,
        }
    }

    pub fn with_symbol(field: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            symbol: Some(symbol.into()),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "({}, {})", self.field, symbol),
            None => f.write_str(&self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: ColumnKey,
    pub cells: Vec<Cell>,
}

/// Chronologically indexed table of price columns.
///
/// Every column holds exactly one cell per index row. Operations never reorder
/// rows except [`PriceTable::sorted_by_index`], which restores chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    index: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl PriceTable {
    pub fn new(index: Vec<DateTime<Utc>>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut table = Self::new(bars.iter().map(|bar| bar.timestamp).collect());
        let extractors: [fn(&Bar) -> f64; 5] = [
            |bar| bar.open,
            |bar| bar.high,
            |bar| bar.low,
            |bar| bar.close,
            |bar| bar.volume,
        ];
        for (field, extract) in OHLCV_FIELDS.iter().zip(extractors) {
            table.columns.push(Column {
                key: ColumnKey::field(*field),
                cells: bars.iter().map(|bar| Cell::Number(extract(bar))).collect(),
            });
        }
        table
    }

    /// Append a column, rejecting it when its length disagrees with the index.
    pub fn push_column(&mut self, key: ColumnKey, cells: Vec<Cell>) -> Result<(), TableError> {
        if cells.len() != self.index.len() {
            return Err(TableError::LengthMismatch {
                column: key.to_string(),
                expected: self.index.len(),
                actual: cells.len(),
            });
        }
        self.columns.push(Column { key, cells });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.key.to_string()).collect()
    }

    /// Look up a single-level column by field name.
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.column_for(field, None)
    }

    pub fn column_for(&self, field: &str, symbol: Option<&str>) -> Option<&Column> {
        self.columns
            .iter()
            .find(|col| col.key.field == field && col.key.symbol.as_deref() == symbol)
    }

    /// Distinct symbols of a combined table, in column order.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in self.columns.iter().filter_map(|col| col.key.symbol.as_ref()) {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
        symbols
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }

    pub fn head(&self, n: usize) -> Self {
        self.select_rows(0..n.min(self.len()))
    }

    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        self.select_rows(start..self.len())
    }

    /// Keep only rows whose timestamp satisfies `keep`.
    pub fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> bool,
    {
        let rows: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, ts)| keep(ts))
            .map(|(row, _)| row)
            .collect();
        self.select_rows(rows)
    }

    /// Drop rows whose timestamp repeats an earlier row, keeping the later one.
    ///
    /// Expects a chronologically sorted index.
    pub fn dedup_index(&self) -> Self {
        let rows: Vec<usize> = (0..self.len())
            .filter(|&row| self.index.get(row + 1) != Some(&self.index[row]))
            .collect();
        self.select_rows(rows)
    }

    /// Stable-sort rows chronologically.
    pub fn sorted_by_index(&self) -> Self {
        let mut rows: Vec<usize> = (0..self.len()).collect();
        rows.sort_by_key(|&row| self.index[row]);
        self.select_rows(rows)
    }

    /// Zero-row table carrying the five OHLCV columns.
    pub fn empty_ohlcv() -> Self {
        Self {
            index: Vec::new(),
            columns: OHLCV_FIELDS
                .iter()
                .map(|field| Column {
                    key: ColumnKey::field(*field),
                    cells: Vec::new(),
                })
                .collect(),
        }
    }

    /// Outer-join per-symbol tables on their timestamps.
    ///
    /// Columns are grouped field-major (`(Close, A)`, `(Close, B)`, `(High, A)`, ...)
    /// and cells are [`Cell::Missing`] wherever a symbol has no bar at a timestamp.
    pub fn combine(tables: &[(String, PriceTable)]) -> Self {
        let index: Vec<DateTime<Utc>> = tables
            .iter()
            .flat_map(|(_, table)| table.index.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut fields: Vec<&str> = Vec::new();
        for (_, table) in tables {
            for column in &table.columns {
                if !fields.contains(&column.key.field.as_str()) {
                    fields.push(column.key.field.as_str());
                }
            }
        }

        let row_lookups: Vec<HashMap<DateTime<Utc>, usize>> = tables
            .iter()
            .map(|(_, table)| {
                table
                    .index
                    .iter()
                    .enumerate()
                    .map(|(row, ts)| (*ts, row))
                    .collect()
            })
            .collect();

        let mut combined = Self::new(index);
        for field in fields {
            for ((symbol, table), lookup) in tables.iter().zip(&row_lookups) {
                let Some(source) = table.columns.iter().find(|col| col.key.field == field) else {
                    continue;
                };
                let cells = combined
                    .index
                    .iter()
                    .map(|ts| {
                        lookup
                            .get(ts)
                            .map_or(Cell::Missing, |&row| source.cells[row].clone())
                    })
                    .collect();
                combined.columns.push(Column {
                    key: ColumnKey::with_symbol(field, symbol.clone()),
                    cells,
                });
            }
        }
        combined
    }

    /// Cross-section: one symbol's columns from a combined table, symbol level dropped.
    ///
    /// The row count always matches the combined table.
    pub fn xs(&self, symbol: &str) -> Self {
        let columns = self
            .columns
            .iter()
            .filter(|col| col.key.symbol.as_deref() == Some(symbol))
            .map(|col| Column {
                key: ColumnKey::field(col.key.field.clone()),
                cells: col.cells.clone(),
            })
            .collect();
        Self {
            index: self.index.clone(),
            columns,
        }
    }

    fn select_rows<I>(&self, rows: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let rows: Vec<usize> = rows.into_iter().collect();
        Self {
            index: rows.iter().map(|&row| self.index[row]).collect(),
            columns: self
                .columns
                .iter()
                .map(|col| Column {
                    key: col.key.clone(),
                    cells: rows.iter().map(|&row| col.cells[row].clone()).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn bars(days: &[u32], base: f64) -> Vec<Bar> {
        days.iter()
            .map(|&d| Bar {
                timestamp: day(d),
                open: base,
                high: base + 2.0,
                low: base - 1.0,
                close: base + 1.0,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn rejects_columns_with_wrong_length() {
        let mut table = PriceTable::new(vec![day(2), day(3)]);
        let err = table
            .push_column(ColumnKey::field("Close"), vec![Cell::Number(1.0)])
            .unwrap_err();
        assert!(err.to_string().contains("Close"));
        assert!(table.columns().is_empty());
    }

    #[test]
    fn combine_outer_joins_and_xs_preserves_row_count() {
        let msft = PriceTable::from_bars(&bars(&[2, 3, 4], 100.0));
        let googl = PriceTable::from_bars(&bars(&[3, 4, 5], 50.0));
        let combined =
            PriceTable::combine(&[("MSFT".to_string(), msft), ("GOOGL".to_string(), googl)]);

        assert_eq!(combined.len(), 4);
        assert_eq!(combined.columns().len(), 10);
        assert_eq!(combined.symbols(), vec!["MSFT", "GOOGL"]);
        assert_eq!(combined.column_names()[0], "(Open, MSFT)");
        assert_eq!(combined.column_names()[1], "(Open, GOOGL)");
        assert!(combined.column("Close").is_none());

        let googl_only = combined.xs("GOOGL");
        assert_eq!(googl_only.len(), combined.len());
        assert_eq!(googl_only.column_names(), OHLCV_FIELDS.to_vec());
        let close = googl_only.column("Close").unwrap();
        assert!(close.cells[0].is_missing());
        assert_eq!(close.cells[3].to_f64(), Some(51.0));
    }

    #[test]
    fn head_tail_and_filter_keep_order() {
        let table = PriceTable::from_bars(&bars(&[2, 3, 4, 5, 8], 10.0));

        assert_eq!(table.head(2).index(), &[day(2), day(3)]);
        assert_eq!(table.tail(2).index(), &[day(5), day(8)]);
        assert_eq!(table.head(10).len(), 5);

        let filtered = table.filter_rows(|ts| *ts >= day(3) && *ts < day(8));
        assert_eq!(filtered.index(), &[day(3), day(4), day(5)]);
        assert_eq!(filtered.columns().len(), 5);
    }

    #[test]
    fn sorts_rows_chronologically() {
        let mut table = PriceTable::new(vec![day(4), day(2), day(3)]);
        table
            .push_column(
                ColumnKey::field("Close"),
                vec![Cell::Number(4.0), Cell::Number(2.0), Cell::Number(3.0)],
            )
            .unwrap();

        let sorted = table.sorted_by_index();
        assert_eq!(sorted.index(), &[day(2), day(3), day(4)]);
        let closes: Vec<_> = sorted
            .column("Close")
            .unwrap()
            .cells
            .iter()
            .map(Cell::to_f64)
            .collect();
        assert_eq!(closes, vec![Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn dedup_keeps_the_later_row() {
        let mut table = PriceTable::new(vec![day(2), day(3), day(3), day(4)]);
        table
            .push_column(
                ColumnKey::field("Close"),
                vec![
                    Cell::Number(2.0),
                    Cell::Number(3.0),
                    Cell::Number(3.5),
                    Cell::Number(4.0),
                ],
            )
            .unwrap();

        let deduped = table.dedup_index();
        assert_eq!(deduped.index(), &[day(2), day(3), day(4)]);
        assert_eq!(deduped.column("Close").unwrap().cells[1].to_f64(), Some(3.5));

        let combined = PriceTable::combine(&[("A".to_string(), deduped.clone())]);
        assert_eq!(combined.xs("A").len(), deduped.len());
    }

    #[test]
    fn combine_keeps_symbol_with_no_rows() {
        let table = PriceTable::from_bars(&bars(&[2, 3], 10.0));
        let combined = PriceTable::combine(&[
            ("MSFT".to_string(), table),
            ("BAD".to_string(), PriceTable::empty_ohlcv()),
        ]);

        assert_eq!(combined.symbols(), vec!["MSFT", "BAD"]);
        let bad = combined.xs("BAD");
        assert_eq!(bad.len(), 2);
        assert_eq!(bad.column_names(), OHLCV_FIELDS.to_vec());
        assert!(bad.columns().iter().all(|col| col.cells.iter().all(Cell::is_missing)));
    }
}
