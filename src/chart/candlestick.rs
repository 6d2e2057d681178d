use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use plotters::prelude::*;

use crate::config::{ChartConfig, Config, Rgb};
use crate::error::ChartError;
use crate::series::{Bar, PriceTable};

use super::prepare::prepare_ohlcv;

const DATE_LABEL_FMT: &str = "%Y-%m-%d";
const DATE_LABEL_FMT_MEDIUM: &str = "%Y-%m";
const Y_LABEL_AREA: u32 = 80;
const X_LABEL_AREA: u32 = 40;
const DATE_LABELS: usize = 8;

/// File name a chart for `symbol` is written to. Path separators become `-`.
pub fn chart_file_name(symbol: &str) -> String {
    format!("{}_candlestick_chart.png", file_stem(symbol))
}

fn file_stem(symbol: &str) -> String {
    symbol.replace(['/', '\\'], "-")
}

/// Candlestick + volume chart writer for one symbol.
#[derive(Debug, Clone)]
pub struct CandlestickChart {
    symbol: String,
    output_dir: PathBuf,
    config: ChartConfig,
}

impl CandlestickChart {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            output_dir: PathBuf::from("."),
            config: Config::builtin().chart,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_config(mut self, config: ChartConfig) -> Self {
        self.config = config;
        self
    }

    pub fn title(&self) -> String {
        format!("{} Candlestick Chart", self.symbol)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(chart_file_name(&self.symbol))
    }

    /// Validate, clean and draw `table`, replacing any previous chart for the symbol.
    ///
    /// Nothing is written unless drawing succeeds; the image is rendered to a
    /// scratch file first and moved into place at the end.
    pub fn render(&self, table: &PriceTable) -> Result<PathBuf, ChartError> {
        let bars = prepare_ohlcv(table)?;

        let target = self.output_path();
        let scratch = self
            .output_dir
            .join(format!(".{}.partial.png", file_stem(&self.symbol)));

        if let Err(err) = self.draw(&bars, &scratch) {
            let _ = fs::remove_file(&scratch);
            return Err(err);
        }
        fs::rename(&scratch, &target)?;
        Ok(target)
    }

    fn draw(&self, bars: &[Bar], path: &Path) -> Result<(), ChartError> {
        let palette = &self.config.palette;
        let rising = rgb(palette.rising);
        let falling = rgb(palette.falling);
        let grid = rgb(palette.grid);

        let root = BitMapBackend::new(path, self.config.canvas_size()).into_drawing_area();
        root.fill(&rgb(palette.background)).map_err(render_error)?;
        let root = root
            .titled(
                &self.title(),
                ("sans-serif", f64::from(self.config.title_font_size)).into_font(),
            )
            .map_err(render_error)?;

        let (_, height) = root.dim_in_pixel();
        let volume_ratio = self.config.volume_ratio.clamp(0.1, 0.6);
        let price_height = (f64::from(height) * (1.0 - volume_ratio)).round() as i32;
        let (upper, lower) = root.split_vertically(price_height);

        // Bars sit at ordinal positions, so weekends and holidays leave no gaps.
        let x_range = -0.5..(bars.len() as f64 - 0.5);
        let (price_min, price_max) = price_bounds(bars);
        let span_days = (bars[bars.len() - 1].timestamp - bars[0].timestamp).num_days();
        let date_fmt = if span_days > 365 {
            DATE_LABEL_FMT_MEDIUM
        } else {
            DATE_LABEL_FMT
        };
        let x_label = |x: &f64| date_label(bars, *x, date_fmt);

        let mut price_chart = ChartBuilder::on(&upper)
            .margin(10)
            .x_label_area_size(0)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(x_range.clone(), price_min..price_max)
            .map_err(render_error)?;
        price_chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(grid)
            .light_line_style(WHITE)
            .y_desc("Price")
            .y_label_formatter(&|value: &f64| format!("{value:.2}"))
            .draw()
            .map_err(render_error)?;

        let body_width = candle_body_width(upper.dim_in_pixel().0, bars.len());
        price_chart
            .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
                CandleStick::new(
                    idx as f64,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    rising.filled(),
                    falling.filled(),
                    body_width,
                )
            }))
            .map_err(render_error)?;

        let volume_max = bars.iter().map(|bar| bar.volume).fold(0.0, f64::max);
        let volume_top = if volume_max > 0.0 { volume_max * 1.1 } else { 1.0 };
        let mut volume_chart = ChartBuilder::on(&lower)
            .margin(10)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(x_range, 0.0..volume_top)
            .map_err(render_error)?;
        volume_chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(grid)
            .light_line_style(WHITE)
            .y_desc("Volume")
            .y_labels(4)
            .y_label_formatter(&|value: &f64| compact_volume(*value))
            .x_labels(DATE_LABELS)
            .x_label_formatter(&x_label)
            .draw()
            .map_err(render_error)?;

        volume_chart
            .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
                let x = idx as f64;
                let color = if bar.is_rising() { rising } else { falling };
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, bar.volume)], color.mix(0.7).filled())
            }))
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
        Ok(())
    }
}

/// Render `table` into `{symbol}_candlestick_chart.png` in the working directory,
/// reporting the outcome on the console.
pub fn create_candlestick_chart(table: &PriceTable, symbol: &str) -> bool {
    create_candlestick_chart_in(table, symbol, Path::new("."))
}

/// Same as [`create_candlestick_chart`], writing into `dir`.
pub fn create_candlestick_chart_in(table: &PriceTable, symbol: &str, dir: &Path) -> bool {
    if table.is_empty() {
        error!("{}", ChartError::EmptyTable);
        return false;
    }

    info!("Creating candlestick chart for {}...", symbol);
    match CandlestickChart::new(symbol).output_dir(dir).render(table) {
        Ok(path) => {
            info!("Chart saved as {}", path.display());
            true
        }
        Err(err @ (ChartError::Render(_) | ChartError::Io(_))) => {
            error!("An error occurred while plotting: {}", err);
            false
        }
        Err(err) => {
            error!("Error: {}", err);
            false
        }
    }
}

fn rgb((r, g, b): Rgb) -> RGBColor {
    RGBColor(r, g, b)
}

fn render_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

/// Low/high envelope with 5% headroom; flat series get a small synthetic span.
fn price_bounds(bars: &[Bar]) -> (f64, f64) {
    let low = bars.iter().map(|bar| bar.low).fold(f64::INFINITY, f64::min);
    let high = bars
        .iter()
        .map(|bar| bar.high)
        .fold(f64::NEG_INFINITY, f64::max);

    if (high - low).abs() < 1e-6 {
        let span = if low.abs() < 1.0 { 1.0 } else { low.abs() * 0.05 };
        return (low - span / 2.0, high + span / 2.0);
    }
    let pad = (high - low) * 0.05;
    (low - pad, high + pad)
}

fn candle_body_width(area_width: u32, count: usize) -> u32 {
    let plot_width = area_width.saturating_sub(Y_LABEL_AREA + 20) as f64;
    let per_bar = plot_width / count.max(1) as f64;
    (per_bar * 0.7).clamp(1.0, 24.0) as u32
}

fn date_label(bars: &[Bar], x: f64, fmt: &str) -> String {
    let idx = x.round();
    if idx < 0.0 || idx as usize >= bars.len() {
        return String::new();
    }
    bars[idx as usize].timestamp.format(fmt).to_string()
}

fn compact_volume(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}
