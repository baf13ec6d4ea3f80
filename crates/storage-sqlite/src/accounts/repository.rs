use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use papertrade_core::accounts::{AccountRepositoryTrait, UserAccount};
use papertrade_core::errors::{DatabaseError, Error, Result};

use super::model::{AccountDB, ACCOUNT_COLUMNS};
use crate::db::{Database, WriteHandle};
use crate::errors::IntoCore;
use crate::utils::format_date;

/// Repository for the user registry.
pub struct AccountRepository {
    db: Database,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(db: Database, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let row = self.db.read(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM accounts WHERE user_id = ?1", ACCOUNT_COLUMNS),
                params![user_id],
                AccountDB::from_row,
            )
            .optional()
            .into_core()
        })?;
        row.map(AccountDB::into_account).transpose()
    }

    async fn upsert_account(&self, account: UserAccount) -> Result<UserAccount> {
        let row = AccountDB::from(&account);
        self.writer
            .exec(move |conn| {
                conn.execute(
                    "INSERT INTO accounts (user_id, starting_cash, last_portfolio_update, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (user_id) DO UPDATE SET
                        starting_cash = excluded.starting_cash,
                        last_portfolio_update = excluded.last_portfolio_update",
                    params![
                        row.user_id,
                        row.starting_cash,
                        row.last_portfolio_update,
                        row.created_at
                    ],
                )
                .into_core()?;
                Ok(())
            })
            .await?;
        Ok(account)
    }

    fn list_pending_update(&self, today: NaiveDate, limit: usize) -> Result<Vec<UserAccount>> {
        let rows = self.db.read(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM accounts
                     WHERE last_portfolio_update IS NULL OR last_portfolio_update < ?1
                     ORDER BY last_portfolio_update IS NOT NULL, last_portfolio_update, user_id
                     LIMIT ?2",
                    ACCOUNT_COLUMNS
                ))
                .into_core()?;
            let rows = stmt
                .query_map(
                    params![format_date(today), limit as i64],
                    AccountDB::from_row,
                )
                .into_core()?;
            let accounts = rows.collect::<rusqlite::Result<Vec<_>>>().into_core();
            accounts
        })?;
        rows.into_iter().map(AccountDB::into_account).collect()
    }

    async fn mark_updated(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = conn
                    .execute(
                        "UPDATE accounts SET last_portfolio_update = ?1 WHERE user_id = ?2",
                        params![format_date(date), user_id],
                    )
                    .into_core()?;
                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "account {}",
                        user_id
                    ))));
                }
                Ok(())
            })
            .await
    }
}
