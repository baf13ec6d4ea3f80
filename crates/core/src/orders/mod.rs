//! Outstanding orders and the execution pipeline that fills them.

mod orders_executor;
mod orders_model;
mod orders_service;
mod orders_traits;

pub use orders_executor::*;
pub use orders_model::*;
pub use orders_service::{OrderExecutionReport, OrderExecutionService, OrderExecutionServiceTrait};
pub use orders_traits::*;

#[cfg(test)]
pub(crate) mod fixtures;
