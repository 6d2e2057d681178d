//! Candlestick + volume PNG rendering.

pub mod candlestick;
pub mod prepare;

pub use candlestick::{
    chart_file_name, create_candlestick_chart, create_candlestick_chart_in, CandlestickChart,
};
pub use prepare::prepare_ohlcv;
