//! Portfolio growth - one valuation point per trading day.

mod growth_builder;
mod growth_model;

pub use growth_builder::*;
pub use growth_model::*;
