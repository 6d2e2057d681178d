use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::RequestError;
use crate::utils::{default_date_range, today};

/// Bar spacing understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
    NinetyMinutes,
    OneHour,
    #[default]
    OneDay,
    FiveDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl Interval {
    const ALL: [Interval; 13] = [
        Interval::OneMinute,
        Interval::TwoMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
        Interval::NinetyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::FiveDays,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::OneMinute
                | Interval::TwoMinutes
                | Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::SixtyMinutes
                | Interval::NinetyMinutes
                | Interval::OneHour
        )
    }
}

impl FromStr for Interval {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Interval::ALL
            .iter()
            .copied()
            .find(|interval| interval.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RequestError::UnknownInterval(s.to_string()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|source| {
        RequestError::InvalidDate {
            input: input.to_string(),
            source,
        }
    })
}

/// Immutable parameters of one history download.
///
/// `start` is inclusive and `end` exclusive. Symbols are trimmed, upper-cased and
/// de-duplicated while keeping the caller's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    symbols: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
}

impl HistoryRequest {
    pub fn new<I, S>(
        symbols: I,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        interval: Interval,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new_as_of(symbols, start, end, interval, today())
    }

    /// Same as [`HistoryRequest::new`] with an explicit "today" for the defaults.
    pub fn new_as_of<I, S>(
        symbols: I,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        interval: Interval,
        today: NaiveDate,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_uppercase();
            if !symbol.is_empty() && !normalized.contains(&symbol) {
                normalized.push(symbol);
            }
        }
        if normalized.is_empty() {
            return Err(RequestError::NoSymbols);
        }

        let (default_start, default_end) = default_date_range(today);
        let start = start.unwrap_or(default_start);
        let end = end.unwrap_or(default_end);
        if start >= end {
            return Err(RequestError::EmptyRange { start, end });
        }

        Ok(Self {
            symbols: normalized,
            start,
            end,
            interval,
        })
    }

    /// Build a request from raw string arguments, as typed on the command line.
    pub fn parse<I, S>(
        symbols: I,
        start: Option<&str>,
        end: Option<&str>,
        interval: Option<&str>,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = start.map(parse_date).transpose()?;
        let end = end.map(parse_date).transpose()?;
        let interval = interval
            .map(str::parse::<Interval>)
            .transpose()?
            .unwrap_or_default();
        Self::new(symbols, start, end, interval)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn is_multi(&self) -> bool {
        self.symbols.len() > 1
    }

    /// Human-readable symbol list for progress messages.
    pub fn symbols_label(&self) -> String {
        self.symbols.join(", ")
    }

    /// Unix seconds for the provider's `period1`/`period2` parameters.
    pub fn period_bounds(&self) -> (i64, i64) {
        let midnight = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or_default()
        };
        (midnight(self.start), midnight(self.end))
    }

    /// Whether a bar timestamp falls on a date inside `[start, end)`.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        date >= self.start && date < self.end
    }
}
