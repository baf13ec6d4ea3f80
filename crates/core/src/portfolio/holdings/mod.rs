//! Holdings projection - folds the ledger into per-symbol positions.

mod holdings_model;
mod holdings_projector;

pub use holdings_model::*;
pub use holdings_projector::*;
