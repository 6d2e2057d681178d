use indexmap::IndexMap;
use log::{debug, error, info, warn};

use crate::error::FetchError;
use crate::series::PriceTable;

use super::{HistoryRequest, MarketDataProvider};

/// How a multi-symbol download is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// One table with `(field, symbol)` columns.
    Combined,
    /// One single-level table per symbol, in request order.
    #[default]
    PerSymbol,
}

/// Result of a history download.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryData {
    Single(PriceTable),
    Multi(IndexMap<String, PriceTable>),
}

impl HistoryData {
    /// The empty sentinel matching what a successful call would have returned.
    pub fn empty_for(request: &HistoryRequest, mode: SplitMode) -> Self {
        if request.is_multi() && mode == SplitMode::PerSymbol {
            HistoryData::Multi(IndexMap::new())
        } else {
            HistoryData::Single(PriceTable::default())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            HistoryData::Single(table) => table.is_empty(),
            HistoryData::Multi(tables) => tables.is_empty(),
        }
    }

    pub fn as_single(&self) -> Option<&PriceTable> {
        match self {
            HistoryData::Single(table) => Some(table),
            HistoryData::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&IndexMap<String, PriceTable>> {
        match self {
            HistoryData::Multi(tables) => Some(tables),
            HistoryData::Single(_) => None,
        }
    }

    /// Label/table pairs; a single table is labelled with `label`.
    pub fn into_tables(self, label: &str) -> Vec<(String, PriceTable)> {
        match self {
            HistoryData::Single(table) => vec![(label.to_string(), table)],
            HistoryData::Multi(tables) => tables.into_iter().collect(),
        }
    }
}

/// Download bars for every requested symbol and shape them per `mode`.
///
/// A single symbol always yields [`HistoryData::Single`]. Rows outside the request
/// range are dropped. When no symbol returns any row the call fails with
/// [`FetchError::NoData`].
///
/// In a multi-symbol request a symbol that fails is logged and kept as an
/// all-missing series; the call only fails when every symbol failed.
pub fn fetch_history<P>(
    provider: &P,
    request: &HistoryRequest,
    mode: SplitMode,
) -> Result<HistoryData, FetchError>
where
    P: MarketDataProvider + ?Sized,
{
    let mut tables = Vec::with_capacity(request.symbols().len());
    let mut failures = Vec::new();
    for symbol in request.symbols() {
        let table = match provider.fetch_bars(symbol, request) {
            Ok(table) => table.filter_rows(|ts| request.contains(ts)),
            Err(err) if request.is_multi() => {
                warn!("Failed to download {}: {}", symbol, err);
                failures.push(err);
                PriceTable::empty_ohlcv()
            }
            Err(err) => return Err(err),
        };
        debug!("{}: {} bars in range", symbol, table.len());
        tables.push((symbol.clone(), table));
    }

    if failures.len() == tables.len() {
        if let Some(err) = failures.into_iter().next() {
            return Err(err);
        }
    }

    if tables.iter().all(|(_, table)| table.is_empty()) {
        return Err(FetchError::NoData {
            symbols: request.symbols().to_vec(),
        });
    }

    if !request.is_multi() {
        if let Some((_, table)) = tables.pop() {
            return Ok(HistoryData::Single(table));
        }
    }

    let combined = PriceTable::combine(&tables);
    Ok(match mode {
        SplitMode::Combined => HistoryData::Single(combined),
        SplitMode::PerSymbol => HistoryData::Multi(
            request
                .symbols()
                .iter()
                .map(|symbol| (symbol.clone(), combined.xs(symbol)))
                .collect(),
        ),
    })
}

/// Download that never fails: problems are logged and an empty result is returned.
pub fn get_historical_data<P>(
    provider: &P,
    request: &HistoryRequest,
    mode: SplitMode,
) -> HistoryData
where
    P: MarketDataProvider + ?Sized,
{
    info!(
        "Downloading historical data for {} from {} to {}...",
        request.symbols_label(),
        request.start(),
        request.end()
    );

    match fetch_history(provider, request, mode) {
        Ok(data) => {
            info!("Data downloaded successfully.");
            data
        }
        Err(FetchError::NoData { .. }) => {
            warn!("No data found. Please check the ticker symbol(s) or date range.");
            HistoryData::empty_for(request, mode)
        }
        Err(err) => {
            error!("An error occurred: {}", err);
            HistoryData::empty_for(request, mode)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::fetch::TickerInfo;
    use crate::series::Bar;

    /// Serves canned daily bars, ignoring the requested range like a sloppy upstream would.
    #[derive(Default)]
    struct StubProvider {
        bars: HashMap<String, PriceTable>,
        failing: bool,
        failing_symbols: Vec<String>,
    }

    impl StubProvider {
        fn with_daily(mut self, symbol: &str, first: NaiveDate, days: i64, base: f64) -> Self {
            let bars: Vec<Bar> = (0..days)
                .map(|offset| {
                    let date = first + Duration::days(offset);
                    Bar {
                        timestamp: Utc
                            .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()),
                        open: base,
                        high: base + 2.0,
                        low: base - 2.0,
                        close: base + 1.0,
                        volume: 1_000.0,
                    }
                })
                .collect();
            self.bars
                .insert(symbol.to_string(), PriceTable::from_bars(&bars));
            self
        }

        fn failing_for(mut self, symbol: &str) -> Self {
            self.failing_symbols.push(symbol.to_string());
            self
        }

        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }
    }

    impl MarketDataProvider for StubProvider {
        fn fetch_bars(
            &self,
            symbol: &str,
            _request: &HistoryRequest,
        ) -> Result<PriceTable, FetchError> {
            if self.failing {
                return Err(FetchError::transport(symbol, "connection reset"));
            }
            if self.failing_symbols.iter().any(|failing| failing == symbol) {
                return Err(FetchError::provider(symbol, "delisted"));
            }
            Ok(self.bars.get(symbol).cloned().unwrap_or_default())
        }

        fn fetch_metadata(&self, symbol: &str) -> Result<TickerInfo, FetchError> {
            Err(FetchError::provider(symbol, "not stubbed"))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_symbol_stays_within_requested_range() {
        let provider = StubProvider::default().with_daily("AAPL", date(2022, 12, 1), 420, 130.0);
        let request =
            HistoryRequest::parse(["AAPL"], Some("2023-01-01"), Some("2024-01-01"), Some("1d"))
                .unwrap();

        let data = fetch_history(&provider, &request, SplitMode::PerSymbol).unwrap();
        let table = data.as_single().expect("single series");

        assert_eq!(table.len(), 365);
        let first = table.first_timestamp().unwrap().date_naive();
        let last = table.last_timestamp().unwrap().date_naive();
        assert!(first >= request.start() && last <= request.end());
        assert_eq!(first, date(2023, 1, 1));
        assert_eq!(last, date(2023, 12, 31));
    }

    #[test]
    fn splitting_mode_matches_combined_row_counts() {
        let provider = StubProvider::default()
            .with_daily("MSFT", date(2023, 1, 1), 30, 240.0)
            .with_daily("GOOGL", date(2023, 1, 10), 30, 90.0);
        let request =
            HistoryRequest::parse(["MSFT", "GOOGL"], Some("2023-01-01"), Some("2023-03-01"), None)
                .unwrap();

        let combined = fetch_history(&provider, &request, SplitMode::Combined).unwrap();
        let combined = combined.as_single().expect("combined table").clone();
        assert_eq!(combined.symbols(), vec!["MSFT", "GOOGL"]);

        let split = fetch_history(&provider, &request, SplitMode::PerSymbol).unwrap();
        let tables = split.as_multi().expect("per-symbol tables");

        assert_eq!(
            tables.keys().cloned().collect::<Vec<_>>(),
            vec!["MSFT".to_string(), "GOOGL".to_string()]
        );
        for (symbol, table) in tables {
            assert_eq!(table.len(), combined.len(), "row count for {symbol}");
            assert_eq!(table.columns().len(), 5);
            let filled = table
                .column("Close")
                .unwrap()
                .cells
                .iter()
                .filter(|cell| !cell.is_missing())
                .count();
            assert_eq!(filled, 30);
        }
    }

    #[test]
    fn provider_failures_become_empty_results() {
        let provider = StubProvider::failing();

        let single = HistoryRequest::parse(["AAPL"], None, None, None).unwrap();
        let data = get_historical_data(&provider, &single, SplitMode::PerSymbol);
        assert_eq!(data, HistoryData::Single(PriceTable::default()));

        let multi = HistoryRequest::parse(["MSFT", "GOOGL"], None, None, None).unwrap();
        let data = get_historical_data(&provider, &multi, SplitMode::PerSymbol);
        assert_eq!(data, HistoryData::Multi(IndexMap::new()));

        let data = get_historical_data(&provider, &multi, SplitMode::Combined);
        assert!(data.as_single().is_some_and(PriceTable::is_empty));

        assert!(matches!(
            fetch_history(&provider, &single, SplitMode::PerSymbol),
            Err(FetchError::Transport { .. })
        ));
    }

    #[test]
    fn failed_symbol_keeps_the_others() {
        let provider = StubProvider::default()
            .with_daily("MSFT", date(2023, 1, 2), 5, 240.0)
            .failing_for("BAD");
        let request =
            HistoryRequest::parse(["MSFT", "BAD"], Some("2023-01-01"), Some("2023-02-01"), None)
                .unwrap();

        let data = get_historical_data(&provider, &request, SplitMode::PerSymbol);
        let tables = data.as_multi().expect("per-symbol tables");

        assert_eq!(
            tables.keys().cloned().collect::<Vec<_>>(),
            vec!["MSFT".to_string(), "BAD".to_string()]
        );
        assert_eq!(tables["MSFT"].len(), 5);
        assert_eq!(tables["BAD"].len(), 5);
        assert_eq!(tables["BAD"].columns().len(), 5);
        assert!(tables["BAD"]
            .columns()
            .iter()
            .all(|col| col.cells.iter().all(|cell| cell.is_missing())));

        let combined = fetch_history(&provider, &request, SplitMode::Combined).unwrap();
        assert_eq!(combined.as_single().unwrap().symbols(), vec!["MSFT", "BAD"]);
    }

    #[test]
    fn empty_symbol_alongside_one_with_rows() {
        let provider = StubProvider::default()
            .with_daily("MSFT", date(2023, 1, 2), 5, 240.0)
            .with_daily("GOOGL", date(2020, 1, 2), 5, 90.0);
        let request =
            HistoryRequest::parse(["MSFT", "GOOGL"], Some("2023-01-01"), Some("2023-02-01"), None)
                .unwrap();

        let data = fetch_history(&provider, &request, SplitMode::PerSymbol).unwrap();
        let tables = data.as_multi().expect("per-symbol tables");

        assert_eq!(tables["MSFT"].len(), 5);
        assert_eq!(tables["GOOGL"].len(), 5);
        assert!(tables["GOOGL"]
            .column("Close")
            .unwrap()
            .cells
            .iter()
            .all(|cell| cell.is_missing()));
    }

    #[test]
    fn every_symbol_failing_is_an_error() {
        let provider = StubProvider::failing();
        let request = HistoryRequest::parse(["MSFT", "BAD"], None, None, None).unwrap();

        assert!(matches!(
            fetch_history(&provider, &request, SplitMode::PerSymbol),
            Err(FetchError::Transport { .. })
        ));
    }

    #[test]
    fn empty_range_is_no_data() {
        let provider = StubProvider::default().with_daily("AAPL", date(2020, 1, 1), 10, 70.0);
        let request =
            HistoryRequest::parse(["AAPL"], Some("2023-01-01"), Some("2024-01-01"), None).unwrap();

        let err = fetch_history(&provider, &request, SplitMode::PerSymbol).unwrap_err();
        assert!(err.is_no_data());
        assert!(get_historical_data(&provider, &request, SplitMode::PerSymbol).is_empty());
    }
}
