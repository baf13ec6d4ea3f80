//! Portfolio repository trait.

use async_trait::async_trait;

use crate::errors::Result;
use crate::portfolio::growth::PortfolioGrowthPoint;
use crate::portfolio::state::PortfolioDetails;

/// Persistence of the per-user portfolio cache and growth series.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    fn get_portfolio_details(&self, user_id: &str) -> Result<Option<PortfolioDetails>>;

    /// Full overwrite of the details document.
    async fn save_portfolio_details(&self, user_id: &str, details: PortfolioDetails) -> Result<()>;

    /// The stored growth series, ordered by date.
    fn get_growth(&self, user_id: &str) -> Result<Vec<PortfolioGrowthPoint>>;

    /// Discards the stored series and writes `points` in its place.
    async fn replace_growth(&self, user_id: &str, points: Vec<PortfolioGrowthPoint>) -> Result<()>;

    /// Adds points whose date is not stored yet. Returns how many were added.
    async fn append_growth(&self, user_id: &str, points: Vec<PortfolioGrowthPoint>)
        -> Result<usize>;

    /// Atomically clears the user's ledger, growth series and OPEN orders and
    /// writes `details` as the new cache.
    async fn reset_user(&self, user_id: &str, details: PortfolioDetails) -> Result<()>;
}
