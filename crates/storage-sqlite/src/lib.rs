//! SQLite storage implementation for Papertrade.
//!
//! This crate implements the repository traits defined in `papertrade-core`
//! on top of `rusqlite`:
//! - a shared connection plus a single writer actor that runs every write in
//!   an IMMEDIATE transaction, retried when SQLite reports the database busy
//! - schema migrations tracked in `PRAGMA user_version`
//! - per-user JSON documents (ledger, portfolio details, growth series) and an
//!   orders table
//!
//! ```text
//! core (domain, traits)
//!        │
//!        ▼
//! storage-sqlite (this crate)
//!        │
//!        ▼
//!    SQLite DB
//! ```

pub mod db;
pub mod documents;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod ledger;
pub mod orders;
pub mod portfolio;

pub use db::{init, run_migrations, spawn_writer, Database, WriteHandle};

pub use errors::{IntoCore, StorageError};

pub use papertrade_core::errors::{DatabaseError, Error, Result};
