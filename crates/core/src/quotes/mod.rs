//! Quote access for the portfolio engine.
//!
//! Market data types live in the `market-data` crate; this module re-exports
//! them and adds the per-run [`QuoteCache`] plus the batched historical loader.

mod historical_loader;
mod quote_cache;

pub use historical_loader::*;
pub use quote_cache::*;

pub use papertrade_market_data::{
    Granularity, HistoricalPrice, MarketDataError, MarketStatus, Quote, QuoteGateway, StockSplit,
};

#[cfg(test)]
pub(crate) mod fixtures;
