//! Ledger module - the append-only transaction and deposit history.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::*;


#[cfg(test)]
pub(crate) mod fixtures;
