use std::fmt;

/// One value in a [`PriceTable`](super::PriceTable) column.
///
/// Providers occasionally send strings or nulls where numbers are expected, so a
/// cell keeps whatever arrived and numeric coercion happens on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Coerce to a finite number. Unparseable text, NaN and infinities count as missing.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value).filter(|v| v.is_finite()),
            Cell::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{value:.0}")
            }
            Cell::Number(value) => write!(f, "{value:.4}"),
            Cell::Text(raw) => f.write_str(raw),
            Cell::Missing => f.write_str("NaN"),
        }
    }
}
