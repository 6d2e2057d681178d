//! Historical bars and instrument metadata from a remote market-data provider.

pub mod decode;
pub mod history;
pub mod info;
pub mod provider;
pub mod request;
pub mod yahoo;

pub use history::{fetch_history, get_historical_data, HistoryData, SplitMode};
pub use info::{fetch_ticker_info, get_ticker_info, InfoValue, TickerInfo};
pub use provider::MarketDataProvider;
pub use request::{parse_date, HistoryRequest, Interval};
pub use yahoo::YahooProvider;
