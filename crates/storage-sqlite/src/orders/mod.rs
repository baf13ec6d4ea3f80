//! SQLite storage implementation for outstanding orders.

mod model;
mod repository;

pub use model::OrderDB;
pub use repository::OrderRepository;
