use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountRepositoryTrait;
use crate::batch::BatchReport;
use crate::errors::Result;
use crate::orders::{
    evaluate_user_orders, OrderRepositoryTrait, OutstandingOrder, SkippedOrder,
    UserOrderSnapshot, UserOrderTransform, UserOrderWrites,
};
use crate::quotes::{QuoteCache, QuoteGateway};
use crate::settings::EngineSettings;

/// Outcome of one execution pass over every user's open orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExecutionReport {
    pub market_open: bool,
    pub users: BatchReport,
    pub filled_orders: usize,
    pub skipped_orders: Vec<SkippedOrder>,
}

#[async_trait]
pub trait OrderExecutionServiceTrait: Send + Sync {
    /// Fills every open order that can be filled at current quotes.
    ///
    /// A closed market makes the run a no-op. Each user's fills commit in
    /// one store transaction; a failing user never blocks the others.
    async fn execute_outstanding_orders(&self) -> Result<OrderExecutionReport>;
}

pub struct OrderExecutionService {
    order_repository: Arc<dyn OrderRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    gateway: Arc<dyn QuoteGateway>,
    settings: EngineSettings,
}

impl OrderExecutionService {
    pub fn new(
        order_repository: Arc<dyn OrderRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        gateway: Arc<dyn QuoteGateway>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            order_repository,
            account_repository,
            gateway,
            settings,
        }
    }

    fn starting_cash_for(&self, user_id: &str) -> Result<Decimal> {
        let default = self.settings.starting_cash;
        Ok(self
            .account_repository
            .get_account(user_id)?
            .map_or(default, |account| account.starting_cash_or(default)))
    }

    async fn execute_for_user(
        &self,
        user_id: String,
        quotes: Arc<QuoteCache>,
    ) -> Result<(UserOrderWrites, Vec<SkippedOrder>)> {
        let starting_cash = self.starting_cash_for(&user_id)?;
        let fees = self.settings.fee_schedule.clone();
        let now = Utc::now();

        // Holds the skips of the attempt that finally commits.
        let skipped: Arc<Mutex<Vec<SkippedOrder>>> = Arc::new(Mutex::new(Vec::new()));
        let skipped_sink = Arc::clone(&skipped);

        let transform: UserOrderTransform = Arc::new(move |snapshot: &UserOrderSnapshot| {
            let evaluation = evaluate_user_orders(snapshot, &quotes, &fees, starting_cash, now)?;
            if let Ok(mut sink) = skipped_sink.lock() {
                *sink = evaluation.skipped;
            }
            Ok(evaluation.writes)
        });

        let writes = self
            .order_repository
            .run_user_transaction(&user_id, transform)
            .await?;
        let skipped = skipped.lock().map(|s| s.clone()).unwrap_or_default();
        Ok((writes, skipped))
    }
}

fn group_by_user(orders: Vec<OutstandingOrder>) -> BTreeMap<String, Vec<OutstandingOrder>> {
    let mut grouped: BTreeMap<String, Vec<OutstandingOrder>> = BTreeMap::new();
    for order in orders {
        grouped.entry(order.user_id.clone()).or_default().push(order);
    }
    grouped
}

#[async_trait]
impl OrderExecutionServiceTrait for OrderExecutionService {
    async fn execute_outstanding_orders(&self) -> Result<OrderExecutionReport> {
        let mut report = OrderExecutionReport::default();

        let status = self.gateway.get_market_status().await?;
        if !status.is_open {
            info!("Market closed. Outstanding orders stay open until the next run.");
            return Ok(report);
        }
        report.market_open = true;

        let open_orders = self.order_repository.list_open_orders()?;
        if open_orders.is_empty() {
            debug!("No outstanding orders");
            return Ok(report);
        }
        let by_user = group_by_user(open_orders);
        info!("Executing outstanding orders for {} users", by_user.len());

        let symbols: Vec<String> = by_user
            .values()
            .flatten()
            .map(|order| order.symbol.clone())
            .collect();
        let quotes = match QuoteCache::prefetch(self.gateway.as_ref(), symbols).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                error!("Quote prefetch failed, no orders executed this run: {}", e);
                for user_id in by_user.keys() {
                    report.users.record_failure(user_id.clone(), &e);
                }
                return Ok(report);
            }
        };

        let results: Vec<(String, Result<(UserOrderWrites, Vec<SkippedOrder>)>)> =
            stream::iter(by_user.into_keys())
                .map(|user_id| {
                    let quotes = Arc::clone(&quotes);
                    async move {
                        let result = self.execute_for_user(user_id.clone(), quotes).await;
                        (user_id, result)
                    }
                })
                .buffer_unordered(self.settings.user_concurrency.max(1))
                .collect()
                .await;

        for (user_id, result) in results {
            match result {
                Ok((writes, skipped)) => {
                    report.filled_orders += writes.fills.len();
                    report.skipped_orders.extend(skipped);
                    if writes.fills.is_empty() {
                        report.users.record_skip(user_id);
                    } else {
                        report.users.record_success(user_id);
                    }
                }
                Err(e) => {
                    error!("Order execution failed for user {}: {}", user_id, e);
                    report.users.record_failure(user_id, &e);
                }
            }
        }

        info!(
            "Order execution finished: {} filled, {} left open, {} users failed",
            report.filled_orders,
            report.skipped_orders.len(),
            report.users.failed.len()
        );
        Ok(report)
    }
}
