//! Database model for accounts.

use papertrade_core::accounts::UserAccount;
use papertrade_core::Result;
use rusqlite::Row;

use crate::utils::{format_date, format_timestamp, parse_date, parse_decimal, parse_timestamp};

/// Column order used by every `SELECT` on `accounts`.
pub const ACCOUNT_COLUMNS: &str = "user_id, starting_cash, last_portfolio_update, created_at";

/// Row of the `accounts` table, columns kept in their stored text form.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDB {
    pub user_id: String,
    pub starting_cash: Option<String>,
    pub last_portfolio_update: Option<String>,
    pub created_at: String,
}

impl AccountDB {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            starting_cash: row.get(1)?,
            last_portfolio_update: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub fn into_account(self) -> Result<UserAccount> {
        Ok(UserAccount {
            user_id: self.user_id,
            starting_cash: self
                .starting_cash
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
            last_portfolio_update: self
                .last_portfolio_update
                .as_deref()
                .map(parse_date)
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl From<&UserAccount> for AccountDB {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.user_id.clone(),
            starting_cash: account.starting_cash.map(|cash| cash.to_string()),
            last_portfolio_update: account.last_portfolio_update.map(format_date),
            created_at: format_timestamp(account.created_at),
        }
    }
}
