pub mod time;

pub use time::{default_date_range, today, DEFAULT_LOOKBACK_DAYS};
