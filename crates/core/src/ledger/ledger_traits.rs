//! Ledger repository trait.

use async_trait::async_trait;

use super::ledger_model::{CashDeposit, Transaction, TransactionHistory};
use crate::errors::Result;

/// Persistence contract for a user's ledger document.
///
/// Appends are additive (union by id): they never overwrite the stored
/// array, so concurrent appenders cannot drop each other's entries.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Reads the whole ledger. A user without a ledger document gets an empty one.
    fn get_transaction_history(&self, user_id: &str) -> Result<TransactionHistory>;

    /// Appends transactions whose ids are not yet present.
    async fn append_transactions(&self, user_id: &str, transactions: &[Transaction]) -> Result<()>;

    /// Appends a cash deposit unless its `transaction_id` is already present.
    async fn append_cash_deposit(&self, user_id: &str, deposit: CashDeposit) -> Result<()>;
}
