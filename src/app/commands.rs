use std::fs;
use std::path::Path;

use crate::chart::create_candlestick_chart_in;
use crate::cli::RangeArgs;
use crate::error::{AppError, Context, Result};
use crate::fetch::{
    get_historical_data, get_ticker_info, HistoryData, HistoryRequest, Interval,
    MarketDataProvider, SplitMode, TickerInfo,
};
use crate::series::PriceTable;

fn request_from(range: &RangeArgs) -> Result<HistoryRequest> {
    Ok(HistoryRequest::parse(
        &range.symbols,
        range.start.as_deref(),
        range.end.as_deref(),
        Some(range.interval.as_str()),
    )?)
}

fn print_preview(label: &str, table: &PriceTable, rows: usize) {
    println!("\n--- {} Historical Data (First {} rows) ---", label, rows);
    println!("{}", table.head(rows));
    println!("\n--- {} Historical Data (Last {} rows) ---", label, rows);
    println!("{}", table.tail(rows));
}

fn print_headline(info: &TickerInfo) {
    let text = |value: Option<&str>| value.unwrap_or("N/A").to_string();
    let number = |value: Option<f64>| value.map_or_else(|| "N/A".to_string(), |v| format!("{v}"));

    println!("Company Name: {}", text(info.long_name()));
    println!("Sector: {}", text(info.sector()));
    println!("Current Price: {}", number(info.current_price()));
    println!("Market Cap: {}", number(info.market_cap()));
    println!("Dividend Rate: {}", number(info.dividend_rate()));
}

/// Render one chart per downloaded table; fails if any chart could not be written.
fn render_all(data: HistoryData, label: &str, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let tables = data.into_tables(label);
    let total = tables.len();
    let failed = tables
        .iter()
        .filter(|(symbol, table)| !create_candlestick_chart_in(table, symbol, output_dir))
        .count();

    if failed > 0 {
        return Err(AppError::message(format!(
            "{} of {} charts could not be rendered",
            failed, total
        )));
    }
    Ok(())
}

pub fn history<P>(provider: &P, range: &RangeArgs, combined: bool, rows: usize) -> Result<()>
where
    P: MarketDataProvider + ?Sized,
{
    let request = request_from(range)?;
    let mode = if combined {
        SplitMode::Combined
    } else {
        SplitMode::PerSymbol
    };

    let data = get_historical_data(provider, &request, mode);
    if data.is_empty() {
        return Err(AppError::message("No historical data to show."));
    }
    for (label, table) in data.into_tables(&request.symbols_label()) {
        print_preview(&label, &table, rows);
    }
    Ok(())
}

pub fn info<P>(provider: &P, symbol: &str) -> Result<()>
where
    P: MarketDataProvider + ?Sized,
{
    let info = get_ticker_info(provider, symbol)
        .ok_or_else(|| AppError::message(format!("No information available for {symbol}")))?;

    println!("\n--- {} Company Info ---", info.symbol());
    print_headline(&info);
    println!("\n{} fields reported:", info.len());
    for (key, value) in info.fields() {
        println!("  {key}: {value}");
    }
    Ok(())
}

pub fn chart<P>(provider: &P, range: &RangeArgs, output_dir: &Path) -> Result<()>
where
    P: MarketDataProvider + ?Sized,
{
    let request = request_from(range)?;
    let data = get_historical_data(provider, &request, SplitMode::PerSymbol);
    if data.is_empty() {
        return Err(AppError::message("No historical data to plot."));
    }
    render_all(data, &request.symbols_label(), output_dir)
}

/// Single-symbol download with charting, a monthly two-symbol download split
/// per symbol, then a metadata lookup. Each step reports and carries on.
pub fn demo<P>(provider: &P, output_dir: &Path) -> Result<()>
where
    P: MarketDataProvider + ?Sized,
{
    let apple = HistoryRequest::parse(["AAPL"], Some("2023-01-01"), Some("2024-01-01"), None)?;
    let data = get_historical_data(provider, &apple, SplitMode::PerSymbol);
    if let Some(table) = data.as_single().filter(|table| !table.is_empty()) {
        print_preview("Apple", table, 5);
    }
    if let Err(err) = render_all(data, "AAPL", output_dir) {
        eprintln!("{err}");
    }

    let multi = HistoryRequest::new(["MSFT", "GOOGL"], None, None, Interval::OneMonth)?;
    let data = get_historical_data(provider, &multi, SplitMode::PerSymbol);
    if let Some(tables) = data.as_multi().filter(|tables| !tables.is_empty()) {
        println!("\n--- Multiple Stocks Historical Data ---");
        for (symbol, table) in tables {
            println!("\n--- {} Historical Data (First 5 rows) ---", symbol);
            println!("{}", table.head(5));
        }
    }
    if let Err(err) = render_all(data, &multi.symbols_label(), output_dir) {
        eprintln!("{err}");
    }

    if let Some(info) = get_ticker_info(provider, "TSLA") {
        println!("\n--- Tesla Company Info ---");
        print_headline(&info);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::error::FetchError;
    use crate::fetch::InfoValue;
    use crate::series::Bar;

    /// Twenty daily bars from the requested start for every symbol; metadata only for TSLA.
    struct CannedProvider;

    impl MarketDataProvider for CannedProvider {
        fn fetch_bars(
            &self,
            symbol: &str,
            request: &HistoryRequest,
        ) -> std::result::Result<PriceTable, FetchError> {
            if symbol == "BAD" {
                return Err(FetchError::provider(symbol, "unknown symbol"));
            }
            let start = Utc.from_utc_datetime(&request.start().and_hms_opt(0, 0, 0).unwrap());
            let bars: Vec<Bar> = (0..20)
                .map(|day| Bar {
                    timestamp: start + Duration::days(day),
                    open: 100.0 + day as f64,
                    high: 103.0 + day as f64,
                    low: 98.0 + day as f64,
                    close: 101.5 + day as f64,
                    volume: 1_000_000.0,
                })
                .collect();
            Ok(PriceTable::from_bars(&bars))
        }

        fn fetch_metadata(&self, symbol: &str) -> std::result::Result<TickerInfo, FetchError> {
            if symbol != "TSLA" {
                return Err(FetchError::provider(symbol, "not found"));
            }
            let mut fields = BTreeMap::new();
            fields.insert("longName".to_string(), InfoValue::Text("Tesla, Inc.".into()));
            Ok(TickerInfo::new(symbol, fields))
        }
    }

    fn range(symbols: &[&str]) -> RangeArgs {
        RangeArgs {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            start: Some("2023-03-01".to_string()),
            end: Some("2023-04-01".to_string()),
            interval: "1d".to_string(),
        }
    }

    #[test]
    fn chart_command_writes_one_png_per_symbol() {
        let dir = tempdir().unwrap();
        chart(&CannedProvider, &range(&["MSFT", "GOOGL"]), dir.path()).unwrap();

        assert!(dir.path().join("MSFT_candlestick_chart.png").exists());
        assert!(dir.path().join("GOOGL_candlestick_chart.png").exists());
    }

    #[test]
    fn chart_command_fails_without_data() {
        let dir = tempdir().unwrap();
        assert!(chart(&CannedProvider, &range(&["BAD"]), dir.path()).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn history_and_info_commands_report_failures() {
        assert!(history(&CannedProvider, &range(&["AAPL"]), false, 3).is_ok());
        assert!(history(&CannedProvider, &range(&["BAD"]), false, 3).is_err());

        let mut bad_dates = range(&["AAPL"]);
        bad_dates.start = Some("2023/03/01".to_string());
        assert!(matches!(
            history(&CannedProvider, &bad_dates, true, 3),
            Err(AppError::Request(_))
        ));

        assert!(info(&CannedProvider, "TSLA").is_ok());
        assert!(info(&CannedProvider, "ZZZZ").is_err());
    }

    #[test]
    fn demo_renders_every_chart() {
        let dir = tempdir().unwrap();
        demo(&CannedProvider, dir.path()).unwrap();

        for symbol in ["AAPL", "MSFT", "GOOGL"] {
            let path = dir.path().join(format!("{symbol}_candlestick_chart.png"));
            assert!(path.exists(), "missing chart for {symbol}");
        }
    }
}
