//! Papertrade Core - Portfolio state engine and order execution.
//!
//! This crate rebuilds a trading account's holdings, cash and growth history
//! from its append-only ledger, and fills outstanding orders against live
//! quotes. It is database-agnostic: persistence is expressed as repository
//! traits implemented by the `storage-sqlite` crate, and market data comes in
//! through the `QuoteGateway` trait of the `market-data` crate.

pub mod accounts;
pub mod batch;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod orders;
pub mod portfolio;
pub mod quotes;
pub mod settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod memory_store;

pub use ledger::*;
pub use portfolio::*;

pub use errors::Error;
pub use errors::Result;
