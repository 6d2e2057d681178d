use std::collections::BTreeMap;
use std::fmt;

use log::{error, info};

use crate::error::FetchError;

use super::MarketDataProvider;

/// A scalar metadata value as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl InfoValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{value:.0}")
            }
            InfoValue::Number(value) => write!(f, "{value}"),
            InfoValue::Text(text) => f.write_str(text),
            InfoValue::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

/// Metadata handle for one instrument. Unknown fields resolve to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerInfo {
    symbol: String,
    fields: BTreeMap<String, InfoValue>,
}

impl TickerInfo {
    pub fn new(symbol: impl Into<String>, fields: BTreeMap<String, InfoValue>) -> Self {
        Self {
            symbol: symbol.into(),
            fields,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn get(&self, field: &str) -> Option<&InfoValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn long_name(&self) -> Option<&str> {
        self.get("longName").and_then(InfoValue::as_str)
    }

    pub fn sector(&self) -> Option<&str> {
        self.get("sector").and_then(InfoValue::as_str)
    }

    pub fn current_price(&self) -> Option<f64> {
        self.get("currentPrice").and_then(InfoValue::as_f64)
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.get("marketCap").and_then(InfoValue::as_f64)
    }

    pub fn dividend_rate(&self) -> Option<f64> {
        self.get("dividendRate").and_then(InfoValue::as_f64)
    }
}

pub fn fetch_ticker_info<P>(provider: &P, symbol: &str) -> Result<TickerInfo, FetchError>
where
    P: MarketDataProvider + ?Sized,
{
    provider.fetch_metadata(symbol.trim())
}

/// Metadata lookup that logs failures and hands back `None` instead of an error.
pub fn get_ticker_info<P>(provider: &P, symbol: &str) -> Option<TickerInfo>
where
    P: MarketDataProvider + ?Sized,
{
    info!("Fetching information for ticker: {}...", symbol);
    match fetch_ticker_info(provider, symbol) {
        Ok(info) => Some(info),
        Err(err) => {
            error!("An error occurred: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HistoryRequest;
    use crate::series::PriceTable;

    struct StaticInfo(Option<TickerInfo>);

    impl MarketDataProvider for StaticInfo {
        fn fetch_bars(
            &self,
            symbol: &str,
            _request: &HistoryRequest,
        ) -> Result<PriceTable, FetchError> {
            Err(FetchError::transport(symbol, "bars not stubbed"))
        }

        fn fetch_metadata(&self, symbol: &str) -> Result<TickerInfo, FetchError> {
            self.0
                .clone()
                .ok_or_else(|| FetchError::provider(symbol, "Quote not found"))
        }
    }

    fn tesla() -> TickerInfo {
        TickerInfo::new(
            "TSLA",
            BTreeMap::from([
                ("longName".to_string(), InfoValue::Text("Tesla, Inc.".into())),
                ("sector".to_string(), InfoValue::Text("Consumer Cyclical".into())),
                ("currentPrice".to_string(), InfoValue::Number(248.5)),
                ("marketCap".to_string(), InfoValue::Number(790_000_000_000.0)),
            ]),
        )
    }

    #[test]
    fn absent_fields_resolve_to_none() {
        let info = tesla();

        assert_eq!(info.long_name(), Some("Tesla, Inc."));
        assert_eq!(info.current_price(), Some(248.5));
        assert_eq!(info.dividend_rate(), None);
        assert!(info.get("beta").is_none());
        assert_eq!(info.get("marketCap").unwrap().to_string(), "790000000000");
    }

    #[test]
    fn provider_errors_become_null_handle() {
        assert!(get_ticker_info(&StaticInfo(None), "NOPE").is_none());

        let found = get_ticker_info(&StaticInfo(Some(tesla())), "TSLA").unwrap();
        assert_eq!(found.symbol(), "TSLA");
        assert_eq!(found.sector(), Some("Consumer Cyclical"));
    }
}
