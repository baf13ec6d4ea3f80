//! Portfolio state - balance, invested value and gains for one account.

mod state_calculator;
mod state_model;

pub use state_calculator::*;
pub use state_model::*;

#[cfg(test)]
mod state_calculator_tests;
