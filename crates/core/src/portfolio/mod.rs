//! Portfolio module - holdings, state, growth series and the services that
//! keep the per-user cache current.

pub mod growth;
pub mod holdings;
pub mod splits;
pub mod state;

mod portfolio_service;
mod portfolio_traits;

pub use portfolio_service::{PortfolioService, PortfolioServiceTrait};
pub use portfolio_traits::PortfolioRepositoryTrait;
