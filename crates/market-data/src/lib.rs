//! Papertrade Market Data Crate
//!
//! This crate defines the Quote Gateway consumed by the portfolio engine:
//! live quotes, historical daily prices, stock split announcements and the
//! market calendar.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +----------------------+     +------------------+
//! |  Portfolio core  | --> |  RateLimitedGateway  | --> |  HttpQuoteGateway |
//! +------------------+     +----------------------+     +------------------+
//!          |                                                      |
//!          v                                                      v
//!   QuoteGateway trait                                   quote service (JSON)
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Latest price for a symbol
//! - [`HistoricalPrice`] - One OHLCV bar
//! - [`StockSplit`] - Split ratio announced for a date
//! - [`MarketStatus`] - Whether the market is open and the holiday calendar
//! - [`QuoteGateway`] - The provider abstraction

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{Granularity, HistoricalPrice, MarketStatus, Quote, StockSplit};
pub use provider::{
    HttpQuoteGateway, QuoteGateway, RateLimitConfig, RateLimitedGateway, TokenBucket,
};
