//! Core error types for the Papertrade engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from SQLite, serde, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use papertrade_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Portfolio calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Data-integrity faults are fatal for the affected user only.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Error::Calculation(_) | Error::Database(DatabaseError::NotFound(_))
        )
    }
}

/// Database-agnostic error type for storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A document changed between the read and the commit of a transaction.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Failed to (de)serialize document: {0}")]
    Serialization(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors that occur while folding a ledger into holdings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    /// A SELL removes more units than are held at that point of the replay.
    #[error(
        "Holding underflow for {symbol}: transaction {transaction_id} sells {units_sold} units while {units_held} are held"
    )]
    HoldingUnderflow {
        symbol: String,
        transaction_id: String,
        units_held: u64,
        units_sold: u64,
    },

    #[error("Invalid transaction {transaction_id}: {reason}")]
    InvalidTransaction {
        transaction_id: String,
        reason: String,
    },
}

/// Validation errors for input data.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Database(DatabaseError::Serialization(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
