//! Per-user outcome reporting shared by the batch entry points.

mod batch_model;

pub use batch_model::*;
