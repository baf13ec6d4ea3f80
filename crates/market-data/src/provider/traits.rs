//! Quote gateway trait definition.
//!
//! This module defines the `QuoteGateway` trait that every market data
//! source consumed by the portfolio engine must implement.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{Granularity, HistoricalPrice, MarketStatus, Quote, StockSplit};

/// Trait for market data gateways.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use papertrade_market_data::{QuoteGateway, Quote};
///
/// struct FixedPriceGateway;
///
/// #[async_trait]
/// impl QuoteGateway for FixedPriceGateway {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
///         // ...
///     }
///
///     // ... remaining methods
/// }
/// ```
#[async_trait]
pub trait QuoteGateway: Send + Sync {
    /// Unique identifier for this gateway, used in logs and rate limiting.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for each symbol.
    ///
    /// Symbols the provider does not know are omitted from the result rather
    /// than failing the whole request.
    async fn get_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, MarketDataError>;

    /// Fetch historical bars for a symbol, `from` and `to` inclusive.
    ///
    /// Bars are returned ordered by date ascending.
    async fn get_historical_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError>;

    /// Splits that take effect on `for_date`.
    async fn get_stock_splits(&self, for_date: NaiveDate)
        -> Result<Vec<StockSplit>, MarketDataError>;

    /// Current market open state and the holiday calendar.
    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError>;
}
