use std::fmt;

use chrono::{DateTime, Timelike, Utc};

use super::PriceTable;

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M";

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    if ts.hour() == 0 && ts.minute() == 0 && ts.second() == 0 {
        ts.format(DATE_FMT).to_string()
    } else {
        ts.format(DATETIME_FMT).to_string()
    }
}

/// Right-aligned console preview, one line per row plus a shape footer.
impl fmt::Display for PriceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns().is_empty() && self.is_empty() {
            return writeln!(f, "Empty table");
        }

        let mut header = vec!["Date".to_string()];
        header.extend(self.column_names());

        let rows: Vec<Vec<String>> = self
            .index()
            .iter()
            .enumerate()
            .map(|(row, ts)| {
                let mut line = vec![format_timestamp(ts)];
                line.extend(self.columns().iter().map(|col| col.cells[row].to_string()));
                line
            })
            .collect();

        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(idx, title)| {
                rows.iter()
                    .map(|line| line[idx].len())
                    .chain(std::iter::once(title.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let render = |f: &mut fmt::Formatter<'_>, line: &[String]| -> fmt::Result {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(idx, (value, &width))| {
                    if idx == 0 {
                        format!("{value:<width$}")
                    } else {
                        format!("{value:>width$}")
                    }
                })
                .collect();
            writeln!(f, "{}", cells.join("  "))
        };

        render(f, &header)?;
        for line in &rows {
            render(f, line)?;
        }
        writeln!(f, "[{} rows x {} columns]", self.len(), self.columns().len())
    }
}
