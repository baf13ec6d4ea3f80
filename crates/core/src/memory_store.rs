//! In-memory implementation of every repository trait, for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::accounts::{AccountRepositoryTrait, UserAccount};
use crate::errors::{DatabaseError, Error, Result};
use crate::ledger::{CashDeposit, LedgerRepositoryTrait, Transaction, TransactionHistory};
use crate::orders::{
    OrderRepositoryTrait, OrderStatus, OutstandingOrder, UserOrderSnapshot, UserOrderTransform,
    UserOrderWrites,
};
use crate::portfolio::growth::PortfolioGrowthPoint;
use crate::portfolio::state::PortfolioDetails;
use crate::portfolio::PortfolioRepositoryTrait;

#[derive(Default, Clone)]
pub struct Documents {
    pub accounts: HashMap<String, UserAccount>,
    pub ledgers: HashMap<String, TransactionHistory>,
    pub details: HashMap<String, PortfolioDetails>,
    pub growth: HashMap<String, Vec<PortfolioGrowthPoint>>,
    pub orders: Vec<OutstandingOrder>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub docs: Mutex<Documents>,
    /// Users whose order transaction fails at commit.
    pub failing_commits: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: UserAccount) -> Self {
        self.docs
            .lock()
            .unwrap()
            .accounts
            .insert(account.user_id.clone(), account);
        self
    }

    pub fn with_history(self, user_id: &str, history: TransactionHistory) -> Self {
        self.docs
            .lock()
            .unwrap()
            .ledgers
            .insert(user_id.to_string(), history);
        self
    }

    pub fn with_details(self, user_id: &str, details: PortfolioDetails) -> Self {
        self.docs
            .lock()
            .unwrap()
            .details
            .insert(user_id.to_string(), details);
        self
    }

    pub fn with_order(self, order: OutstandingOrder) -> Self {
        self.docs.lock().unwrap().orders.push(order);
        self
    }

    pub fn with_growth(self, user_id: &str, points: Vec<PortfolioGrowthPoint>) -> Self {
        self.docs
            .lock()
            .unwrap()
            .growth
            .insert(user_id.to_string(), points);
        self
    }

    pub fn fail_commits_for(&self, user_id: &str) {
        self.failing_commits
            .lock()
            .unwrap()
            .insert(user_id.to_string());
    }

    pub fn snapshot(&self) -> Documents {
        self.docs.lock().unwrap().clone()
    }

    pub fn order(&self, order_id: &str) -> OutstandingOrder {
        self.snapshot()
            .orders
            .into_iter()
            .find(|o| o.order_id == order_id)
            .unwrap()
    }

    pub fn history(&self, user_id: &str) -> TransactionHistory {
        self.snapshot()
            .ledgers
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountRepositoryTrait for MemoryStore {
    fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>> {
        Ok(self.docs.lock().unwrap().accounts.get(user_id).cloned())
    }

    async fn upsert_account(&self, account: UserAccount) -> Result<UserAccount> {
        self.docs
            .lock()
            .unwrap()
            .accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(account)
    }

    fn list_pending_update(&self, today: NaiveDate, limit: usize) -> Result<Vec<UserAccount>> {
        let mut pending: Vec<UserAccount> = self
            .docs
            .lock()
            .unwrap()
            .accounts
            .values()
            .filter(|a| a.needs_update(today))
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.last_portfolio_update
                .cmp(&b.last_portfolio_update)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_updated(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        let account = docs
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(user_id.to_string())))?;
        account.last_portfolio_update = Some(date);
        Ok(())
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MemoryStore {
    fn get_transaction_history(&self, user_id: &str) -> Result<TransactionHistory> {
        Ok(self.history(user_id))
    }

    async fn append_transactions(&self, user_id: &str, transactions: &[Transaction]) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        let ledger = docs.ledgers.entry(user_id.to_string()).or_default();
        for transaction in transactions {
            ledger.append_transaction(transaction.clone());
        }
        Ok(())
    }

    async fn append_cash_deposit(&self, user_id: &str, deposit: CashDeposit) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.ledgers
            .entry(user_id.to_string())
            .or_default()
            .append_cash_deposit(deposit);
        Ok(())
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for MemoryStore {
    fn get_portfolio_details(&self, user_id: &str) -> Result<Option<PortfolioDetails>> {
        Ok(self.docs.lock().unwrap().details.get(user_id).cloned())
    }

    async fn save_portfolio_details(&self, user_id: &str, details: PortfolioDetails) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .details
            .insert(user_id.to_string(), details);
        Ok(())
    }

    fn get_growth(&self, user_id: &str) -> Result<Vec<PortfolioGrowthPoint>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .growth
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_growth(&self, user_id: &str, points: Vec<PortfolioGrowthPoint>) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .growth
            .insert(user_id.to_string(), points);
        Ok(())
    }

    async fn append_growth(
        &self,
        user_id: &str,
        points: Vec<PortfolioGrowthPoint>,
    ) -> Result<usize> {
        let mut docs = self.docs.lock().unwrap();
        let series = docs.growth.entry(user_id.to_string()).or_default();
        let mut added = 0;
        for point in points {
            if !series.iter().any(|p| p.date == point.date) {
                series.push(point);
                added += 1;
            }
        }
        series.sort_by_key(|p| p.date);
        Ok(added)
    }

    async fn reset_user(&self, user_id: &str, details: PortfolioDetails) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.ledgers.remove(user_id);
        docs.growth.remove(user_id);
        docs.orders
            .retain(|o| !(o.user_id == user_id && o.status == OrderStatus::Open));
        docs.details.insert(user_id.to_string(), details);
        Ok(())
    }
}

#[async_trait]
impl OrderRepositoryTrait for MemoryStore {
    fn list_open_orders(&self) -> Result<Vec<OutstandingOrder>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|o| o.is_open())
            .cloned()
            .collect())
    }

    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<OutstandingOrder>> {
        let mut orders: Vec<OutstandingOrder> = self
            .docs
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn create_order(&self, order: OutstandingOrder) -> Result<OutstandingOrder> {
        self.docs.lock().unwrap().orders.push(order.clone());
        Ok(order)
    }

    /// Works on a copy of the documents and swaps it in only on success.
    async fn run_user_transaction(
        &self,
        user_id: &str,
        transform: UserOrderTransform,
    ) -> Result<UserOrderWrites> {
        let mut docs = self.docs.lock().unwrap();
        let snapshot = UserOrderSnapshot {
            user_id: user_id.to_string(),
            open_orders: docs
                .orders
                .iter()
                .filter(|o| o.user_id == user_id && o.is_open())
                .cloned()
                .collect(),
            details: docs.details.get(user_id).cloned(),
            history: docs.ledgers.get(user_id).cloned().unwrap_or_default(),
        };
        let writes = transform(&snapshot)?;

        let mut staged = docs.clone();
        for fill in &writes.fills {
            staged
                .ledgers
                .entry(user_id.to_string())
                .or_default()
                .append_transaction(fill.transaction.clone());
            let stored = staged
                .orders
                .iter_mut()
                .find(|o| o.order_id == fill.order.order_id && o.is_open())
                .ok_or_else(|| {
                    Error::Database(DatabaseError::Conflict(fill.order.order_id.clone()))
                })?;
            *stored = fill.order.clone();
        }
        if let Some(details) = &writes.details {
            staged.details.insert(user_id.to_string(), details.clone());
        }

        if self.failing_commits.lock().unwrap().contains(user_id) {
            return Err(Error::Database(DatabaseError::TransactionFailed(format!(
                "commit aborted for {}",
                user_id
            ))));
        }
        *docs = staged;
        Ok(writes)
    }
}
