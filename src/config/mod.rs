use std::time::Duration;

/// Endpoints and request headers for the Yahoo Finance public API.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub chart_endpoint: String,
    pub quote_summary_endpoint: String,
    pub cookie_endpoint: String,
    pub crumb_endpoint: String,
    pub summary_modules: Vec<String>,
    pub user_agent: String,
    pub referer: String,
    pub accept_language: String,
    pub timeout: Duration,
}

/// RGB triple kept free of any drawing-library type.
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone)]
pub struct ChartPalette {
    pub background: Rgb,
    pub rising: Rgb,
    pub falling: Rgb,
    pub grid: Rgb,
}

#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub base_width: u32,
    pub base_height: u32,
    /// Multiplier applied to the base canvas size.
    pub figscale: f64,
    /// Share of the canvas height given to the volume panel.
    pub volume_ratio: f64,
    pub title_font_size: u32,
    pub palette: ChartPalette,
}

impl ChartConfig {
    pub fn canvas_size(&self) -> (u32, u32) {
        let scale = if self.figscale.is_finite() && self.figscale > 0.0 {
            self.figscale
        } else {
            1.0
        };
        (
            (f64::from(self.base_width) * scale).round() as u32,
            (f64::from(self.base_height) * scale).round() as u32,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: YahooConfig,
    pub chart: ChartConfig,
}

impl Config {
    pub fn builtin() -> Self {
        let provider = YahooConfig {
            chart_endpoint: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            quote_summary_endpoint: "https://query2.finance.yahoo.com/v10/finance/quoteSummary"
                .to_string(),
            cookie_endpoint: "https://fc.yahoo.com".to_string(),
            crumb_endpoint: "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string(),
            summary_modules: [
                "price",
                "summaryProfile",
                "summaryDetail",
                "financialData",
                "defaultKeyStatistics",
            ]
            .iter()
            .map(|module| module.to_string())
            .collect(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            referer: "https://finance.yahoo.com/".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout: Duration::from_secs(10),
        };

        let chart = ChartConfig {
            base_width: 800,
            base_height: 575,
            figscale: 1.5,
            volume_ratio: 0.3,
            title_font_size: 28,
            palette: ChartPalette {
                background: (255, 255, 255),
                rising: (0, 99, 64),
                falling: (160, 33, 40),
                grid: (220, 220, 220),
            },
        };

        Config { provider, chart }
    }
}
