use log::debug;
use reqwest::{
    blocking::{Client, Response},
    header::{ACCEPT_LANGUAGE, REFERER, USER_AGENT},
    Url,
};

use crate::config::YahooConfig;
use crate::error::{Context, FetchError, Result};
use crate::series::PriceTable;

use super::decode::{api_error_message, parse_chart_payload, parse_quote_summary};
use super::{HistoryRequest, MarketDataProvider, TickerInfo};

/// Blocking client for the public Yahoo Finance endpoints.
pub struct YahooProvider {
    client: Client,
    config: YahooConfig,
}

impl YahooProvider {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .context("Failed to construct Yahoo HTTP client")?;
        Ok(Self { client, config })
    }

    fn symbol_url(&self, endpoint: &str, symbol: &str) -> std::result::Result<Url, FetchError> {
        let mut url = Url::parse(endpoint).map_err(|err| {
            FetchError::transport(symbol, format!("invalid endpoint {endpoint}: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::transport(symbol, format!("endpoint {endpoint} cannot take a path"))
            })?
            .push(symbol);
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(url)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header(REFERER, self.config.referer.as_str())
            .header(ACCEPT_LANGUAGE, self.config.accept_language.as_str())
    }

    /// Read the body, turning non-success statuses into the most specific error available.
    fn read_body(symbol: &str, response: Response) -> std::result::Result<String, FetchError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| FetchError::transport(symbol, format!("failed to read body: {err}")))?;

        if status.is_success() {
            return Ok(body);
        }
        match api_error_message(&body) {
            Some(message) => Err(FetchError::provider(symbol, message)),
            None => Err(FetchError::transport(
                symbol,
                format!("request returned error status {status}"),
            )),
        }
    }

    /// The quoteSummary endpoint only answers with a session cookie and matching crumb.
    fn fetch_crumb(&self, symbol: &str) -> std::result::Result<String, FetchError> {
        let cookie_url = Url::parse(&self.config.cookie_endpoint).map_err(|err| {
            FetchError::transport(symbol, format!("invalid cookie endpoint: {err}"))
        })?;
        // fc.yahoo.com answers 404 but still sets the session cookie.
        self.get(cookie_url)
            .send()
            .map_err(|err| FetchError::transport(symbol, format!("cookie request failed: {err}")))?;

        let crumb_url = Url::parse(&self.config.crumb_endpoint).map_err(|err| {
            FetchError::transport(symbol, format!("invalid crumb endpoint: {err}"))
        })?;
        let response = self
            .get(crumb_url)
            .send()
            .map_err(|err| FetchError::transport(symbol, format!("crumb request failed: {err}")))?;
        let crumb = Self::read_body(symbol, response)?.trim().to_string();

        if crumb.to_lowercase().contains("too many requests") {
            return Err(FetchError::provider(symbol, "rate limited while fetching crumb"));
        }
        if crumb.is_empty() || crumb.len() >= 100 || crumb.contains(' ') || crumb.contains('<') {
            return Err(FetchError::provider(symbol, "provider returned an unusable crumb"));
        }
        Ok(crumb)
    }
}

impl MarketDataProvider for YahooProvider {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> std::result::Result<PriceTable, FetchError> {
        let url = self.symbol_url(&self.config.chart_endpoint, symbol)?;
        let (period1, period2) = request.period_bounds();
        let interval = request.interval();

        debug!("GET {url} period1={period1} period2={period2} interval={interval}");
        let response = self
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.to_string()),
                ("events", "history".to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .map_err(|err| {
                FetchError::transport(symbol, format!("history request failed: {err}"))
            })?;

        let body = Self::read_body(symbol, response)?;
        parse_chart_payload(symbol, &body, interval)
    }

    fn fetch_metadata(&self, symbol: &str) -> std::result::Result<TickerInfo, FetchError> {
        let crumb = self.fetch_crumb(symbol)?;
        let url = self.symbol_url(&self.config.quote_summary_endpoint, symbol)?;

        debug!("GET {url} modules={}", self.config.summary_modules.join(","));
        let response = self
            .get(url)
            .query(&[
                ("modules", self.config.summary_modules.join(",")),
                ("crumb", crumb),
            ])
            .send()
            .map_err(|err| {
                FetchError::transport(symbol, format!("metadata request failed: {err}"))
            })?;

        let body = Self::read_body(symbol, response)?;
        parse_quote_summary(symbol, &body)
    }
}
