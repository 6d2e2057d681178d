//! Decoders for the Yahoo Finance chart and quoteSummary payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::series::{Cell, ColumnKey, PriceTable, OHLCV_FIELDS};

use super::{InfoValue, Interval, TickerInfo};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "gmtoffset", default)]
    gmt_offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

/// Raw values are kept as JSON so nulls and stray strings survive into the table.
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Value>,
    #[serde(default)]
    high: Vec<Value>,
    #[serde(default)]
    low: Vec<Value>,
    #[serde(default)]
    close: Vec<Value>,
    #[serde(default)]
    volume: Vec<Value>,
}

impl ChartQuote {
    fn series(&self, field: &str) -> &[Value] {
        match field {
            "Open" => &self.open,
            "High" => &self.high,
            "Low" => &self.low,
            "Close" => &self.close,
            _ => &self.volume,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiError {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (_, Some(description)) if !description.is_empty() => description.clone(),
            (Some(code), _) => code.clone(),
            _ => "unknown provider error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<ApiError>,
}

pub fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Number(num) => num.as_f64().map_or(Cell::Missing, Cell::Number),
        Value::String(raw) => Cell::Text(raw.clone()),
        Value::Null => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

/// Flatten one quoteSummary field. Yahoo wraps most numbers as `{"raw": .., "fmt": ..}`.
pub fn value_to_info(value: &Value) -> Option<InfoValue> {
    match value {
        Value::Number(num) => num.as_f64().map(InfoValue::Number),
        Value::String(text) if !text.is_empty() => Some(InfoValue::Text(text.clone())),
        Value::Bool(flag) => Some(InfoValue::Bool(*flag)),
        Value::Object(object) => match object.get("raw") {
            Some(Value::Number(num)) => num.as_f64().map(InfoValue::Number),
            _ => object
                .get("fmt")
                .and_then(Value::as_str)
                .filter(|fmt| !fmt.is_empty())
                .map(|fmt| InfoValue::Text(fmt.to_string())),
        },
        _ => None,
    }
}

/// API-level error description from a chart or quoteSummary body, if present.
pub fn api_error_message(body: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(body) {
        return envelope.chart.error.map(|err| err.message());
    }
    serde_json::from_str::<QuoteSummaryEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.quote_summary.error.map(|err| err.message()))
}

/// Decode a v8 chart payload into a single-symbol OHLCV table.
///
/// For daily and coarser intervals the timestamps are moved to midnight of the
/// exchange-local trading date, so one bar maps to one calendar day. Rows that
/// share a timestamp collapse to the last one in the payload.
pub fn parse_chart_payload(
    symbol: &str,
    body: &str,
    interval: Interval,
) -> Result<PriceTable, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|err| {
        FetchError::provider(symbol, format!("failed to parse chart payload: {err}"))
    })?;

    if let Some(error) = envelope.chart.error {
        return Err(FetchError::provider(symbol, error.message()));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::provider(symbol, "no chart data in response"))?;

    let gmt_offset = result
        .meta
        .as_ref()
        .and_then(|meta| meta.gmt_offset)
        .unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .and_then(|indicators| indicators.quote.into_iter().next())
        .unwrap_or_default();

    let index = timestamps
        .iter()
        .map(|&ts| to_bar_timestamp(ts, gmt_offset, interval))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            FetchError::provider(symbol, "chart payload contains an invalid timestamp")
        })?;

    let mut table = PriceTable::new(index);
    for field in OHLCV_FIELDS {
        let raw = quote.series(field);
        let cells = (0..timestamps.len())
            .map(|row| raw.get(row).map_or(Cell::Missing, value_to_cell))
            .collect();
        table
            .push_column(ColumnKey::field(field), cells)
            .map_err(|err| FetchError::provider(symbol, err.to_string()))?;
    }

    // A live daily bar can land on the previous bar's date; the later row wins.
    Ok(table.sorted_by_index().dedup_index())
}

fn to_bar_timestamp(ts: i64, gmt_offset: i64, interval: Interval) -> Option<DateTime<Utc>> {
    let instant = Utc.timestamp_opt(ts, 0).single()?;
    if interval.is_intraday() {
        return Some(instant);
    }
    let local_date = (instant + Duration::seconds(gmt_offset)).date_naive();
    Some(local_date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Decode a v10 quoteSummary payload into a flat field map.
///
/// Modules are merged in payload order; the first module that provides a field wins.
pub fn parse_quote_summary(symbol: &str, body: &str) -> Result<TickerInfo, FetchError> {
    let envelope: QuoteSummaryEnvelope = serde_json::from_str(body).map_err(|err| {
        FetchError::provider(symbol, format!("failed to parse quoteSummary payload: {err}"))
    })?;

    if let Some(error) = envelope.quote_summary.error {
        return Err(FetchError::provider(symbol, error.message()));
    }

    let modules = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::provider(symbol, "no quoteSummary data in response"))?;

    let mut fields = BTreeMap::new();
    for module in modules.values() {
        let Some(object) = module.as_object() else {
            continue;
        };
        for (key, value) in object {
            if let Some(info) = value_to_info(value) {
                fields.entry(key.clone()).or_insert(info);
            }
        }
    }
    fields
        .entry("symbol".to_string())
        .or_insert_with(|| InfoValue::Text(symbol.to_string()));

    Ok(TickerInfo::new(symbol, fields))
}
