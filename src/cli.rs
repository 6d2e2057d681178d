use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stock-chart")]
#[command(
    about = "Download historical prices, look up ticker metadata and render candlestick charts"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Symbol list plus the date range and bar size shared by the download commands.
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// Ticker symbols (e.g., AAPL MSFT GOOGL)
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// First day to include, YYYY-MM-DD (default: one year before today)
    #[arg(short, long)]
    pub start: Option<String>,

    /// Day after the last one to include, YYYY-MM-DD (default: today)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Bar size such as 1d, 1wk or 1mo
    #[arg(short, long, default_value = "1d")]
    pub interval: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download historical OHLCV data and print a preview
    History {
        #[command(flatten)]
        range: RangeArgs,

        /// Keep multiple symbols in one table with (field, symbol) columns
        #[arg(long)]
        combined: bool,

        /// Rows to show from the start and end of each table
        #[arg(short, long, default_value_t = 5)]
        rows: usize,
    },

    /// Show descriptive information for one ticker
    Info {
        /// Ticker symbol (e.g., TSLA)
        symbol: String,
    },

    /// Download data and render one candlestick chart per symbol
    Chart {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Run the AAPL, MSFT/GOOGL and TSLA walkthrough
    Demo {
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}
