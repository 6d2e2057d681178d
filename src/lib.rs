pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod series;
pub mod utils;

pub use error::{AppError, Result};
