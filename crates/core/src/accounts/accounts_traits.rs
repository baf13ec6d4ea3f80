//! Account repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::accounts_model::UserAccount;
use crate::errors::Result;

/// Persistence of the user registry.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Retrieves an account by user id, `None` if unknown.
    fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>>;

    /// Inserts the account or replaces the stored one.
    async fn upsert_account(&self, account: UserAccount) -> Result<UserAccount>;

    /// Up to `limit` accounts whose last nightly update is before `today`
    /// (or never happened), oldest update first.
    fn list_pending_update(&self, today: NaiveDate, limit: usize) -> Result<Vec<UserAccount>>;

    /// Records that the nightly update for `date` has completed.
    async fn mark_updated(&self, user_id: &str, date: NaiveDate) -> Result<()>;
}
