//! SQLite storage implementation for the portfolio cache and growth series.

mod repository;

pub use repository::PortfolioRepository;
