use chrono::{Duration, Local, NaiveDate};

/// Span covered by a history request when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `[today - 365 days, today]`, as a pure function of `today`.
pub fn default_date_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(DEFAULT_LOOKBACK_DAYS), today)
}
