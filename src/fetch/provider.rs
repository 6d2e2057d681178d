use crate::error::FetchError;
use crate::series::PriceTable;

use super::{HistoryRequest, TickerInfo};

/// Seam between the fetch flows and a concrete market-data service.
pub trait MarketDataProvider {
    /// Bars for one symbol over the request's range and interval, chronologically ordered.
    fn fetch_bars(&self, symbol: &str, request: &HistoryRequest)
        -> Result<PriceTable, FetchError>;

    /// Descriptive fields for one symbol.
    fn fetch_metadata(&self, symbol: &str) -> Result<TickerInfo, FetchError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for &P {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<PriceTable, FetchError> {
        (**self).fetch_bars(symbol, request)
    }

    fn fetch_metadata(&self, symbol: &str) -> Result<TickerInfo, FetchError> {
        (**self).fetch_metadata(symbol)
    }
}
