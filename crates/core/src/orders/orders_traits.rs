//! Order repository trait and the per-user transaction contract.

use std::sync::Arc;

use async_trait::async_trait;

use super::orders_model::{OrderFill, OutstandingOrder};
use crate::errors::Result;
use crate::ledger::TransactionHistory;
use crate::portfolio::state::PortfolioDetails;

/// Everything one user's execution pass reads, taken at a single
/// consistent point inside the store transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOrderSnapshot {
    pub user_id: String,
    /// The user's OPEN orders.
    pub open_orders: Vec<OutstandingOrder>,
    pub details: Option<PortfolioDetails>,
    pub history: TransactionHistory,
}

/// Writes committed all-or-nothing at the end of a user transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOrderWrites {
    /// Each fill union-appends its transaction and closes its order.
    pub fills: Vec<OrderFill>,
    /// Replaces the cached details document when set.
    pub details: Option<PortfolioDetails>,
}

impl UserOrderWrites {
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty() && self.details.is_none()
    }
}

/// Pure transform run inside the user transaction. Implementations may call
/// it more than once when the transaction is retried after contention, each
/// time with a freshly read snapshot.
pub type UserOrderTransform =
    Arc<dyn Fn(&UserOrderSnapshot) -> Result<UserOrderWrites> + Send + Sync>;

/// Persistence of outstanding orders.
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    /// All OPEN orders across every user.
    fn list_open_orders(&self) -> Result<Vec<OutstandingOrder>>;

    /// Every order of one user, any status, newest first.
    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<OutstandingOrder>>;

    async fn create_order(&self, order: OutstandingOrder) -> Result<OutstandingOrder>;

    /// Reads a [`UserOrderSnapshot`] for `user_id`, applies `transform` and
    /// commits the resulting writes atomically. Closing an order that is no
    /// longer OPEN aborts the whole transaction. Nothing is written when the
    /// transform fails.
    async fn run_user_transaction(
        &self,
        user_id: &str,
        transform: UserOrderTransform,
    ) -> Result<UserOrderWrites>;
}
