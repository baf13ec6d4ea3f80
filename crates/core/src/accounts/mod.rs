//! Accounts module - users tracked by the portfolio engine.

mod accounts_model;
mod accounts_traits;

pub use accounts_model::UserAccount;
pub use accounts_traits::AccountRepositoryTrait;
