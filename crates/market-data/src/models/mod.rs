//! Market data models.

mod calendar;
mod quote;

pub use calendar::{MarketStatus, StockSplit};
pub use quote::{Granularity, HistoricalPrice, Quote};
