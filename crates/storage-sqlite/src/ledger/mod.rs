//! SQLite storage implementation for ledgers.

mod repository;

pub use repository::LedgerRepository;
