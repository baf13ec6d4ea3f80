use async_trait::async_trait;
use log::debug;

use papertrade_core::errors::Result;
use papertrade_core::ledger::{
    CashDeposit, LedgerRepositoryTrait, Transaction, TransactionHistory,
};

use crate::db::{Database, WriteHandle};
use crate::documents::{self, DocumentKind};

/// Stores each user's ledger as one JSON document.
pub struct LedgerRepository {
    db: Database,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(db: Database, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_transaction_history(&self, user_id: &str) -> Result<TransactionHistory> {
        let history = self
            .db
            .read(|conn| documents::load(conn, user_id, DocumentKind::Ledger))?;
        Ok(history.unwrap_or_default())
    }

    async fn append_transactions(&self, user_id: &str, transactions: &[Transaction]) -> Result<()> {
        for transaction in transactions {
            transaction.validate()?;
        }
        let user_id = user_id.to_string();
        let transactions = transactions.to_vec();
        self.writer
            .exec(move |conn| {
                let mut history: TransactionHistory =
                    documents::load(conn, &user_id, DocumentKind::Ledger)?.unwrap_or_default();
                let added = transactions
                    .iter()
                    .filter(|t| history.append_transaction((*t).clone()))
                    .count();
                if added > 0 {
                    documents::store(conn, &user_id, DocumentKind::Ledger, &history)?;
                }
                debug!(
                    "Appended {} of {} transactions to the ledger of {}",
                    added,
                    transactions.len(),
                    user_id
                );
                Ok(())
            })
            .await
    }

    async fn append_cash_deposit(&self, user_id: &str, deposit: CashDeposit) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut history: TransactionHistory =
                    documents::load(conn, &user_id, DocumentKind::Ledger)?.unwrap_or_default();
                if history.append_cash_deposit(deposit.clone()) {
                    documents::store(conn, &user_id, DocumentKind::Ledger, &history)?;
                }
                Ok(())
            })
            .await
    }
}
