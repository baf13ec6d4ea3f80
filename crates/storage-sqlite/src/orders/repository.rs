use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, Connection};

use papertrade_core::errors::{DatabaseError, Error, Result};
use papertrade_core::ledger::TransactionHistory;
use papertrade_core::orders::{
    OrderRepositoryTrait, OrderStatus, OutstandingOrder, UserOrderSnapshot, UserOrderTransform,
    UserOrderWrites,
};
use papertrade_core::portfolio::state::PortfolioDetails;

use super::model::OrderDB;
use crate::db::{Database, WriteHandle};
use crate::documents::{self, DocumentKind};
use crate::errors::IntoCore;

const ORDER_COLUMNS: &str = "order_id, user_id, status, created_at, body";

pub struct OrderRepository {
    db: Database,
    writer: WriteHandle,
}

impl OrderRepository {
    pub fn new(db: Database, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

fn query_orders(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<OutstandingOrder>> {
    let mut stmt = conn.prepare(sql).into_core()?;
    let rows = stmt.query_map(params, OrderDB::from_row).into_core()?;
    let rows = rows.collect::<rusqlite::Result<Vec<_>>>().into_core()?;
    rows.into_iter().map(OrderDB::into_order).collect()
}

fn open_orders_for_user(conn: &Connection, user_id: &str) -> Result<Vec<OutstandingOrder>> {
    query_orders(
        conn,
        &format!(
            "SELECT {} FROM outstanding_orders
             WHERE user_id = ?1 AND status = ?2
             ORDER BY created_at, order_id",
            ORDER_COLUMNS
        ),
        params![user_id, OrderStatus::Open.as_str()],
    )
}

/// Writes the closed order back, but only over a row that is still OPEN.
fn close_order(conn: &Connection, user_id: &str, order: &OutstandingOrder) -> Result<()> {
    let row = OrderDB::from_order(order)?;
    let updated = conn
        .execute(
            "UPDATE outstanding_orders SET status = ?1, body = ?2
             WHERE order_id = ?3 AND user_id = ?4 AND status = ?5",
            params![
                row.status,
                row.body,
                row.order_id,
                user_id,
                OrderStatus::Open.as_str()
            ],
        )
        .into_core()?;
    if updated == 0 {
        warn!(
            "Order {} of {} is no longer open, aborting the transaction",
            order.order_id, user_id
        );
        return Err(Error::Database(DatabaseError::Conflict(format!(
            "order {} is not open",
            order.order_id
        ))));
    }
    Ok(())
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    fn list_open_orders(&self) -> Result<Vec<OutstandingOrder>> {
        self.db.read(|conn| {
            query_orders(
                conn,
                &format!(
                    "SELECT {} FROM outstanding_orders WHERE status = ?1
                     ORDER BY created_at, order_id",
                    ORDER_COLUMNS
                ),
                params![OrderStatus::Open.as_str()],
            )
        })
    }

    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<OutstandingOrder>> {
        self.db.read(|conn| {
            query_orders(
                conn,
                &format!(
                    "SELECT {} FROM outstanding_orders WHERE user_id = ?1
                     ORDER BY created_at DESC, order_id DESC",
                    ORDER_COLUMNS
                ),
                params![user_id],
            )
        })
    }

    async fn create_order(&self, order: OutstandingOrder) -> Result<OutstandingOrder> {
        let row = OrderDB::from_order(&order)?;
        self.writer
            .exec(move |conn| {
                conn.execute(
                    "INSERT INTO outstanding_orders (order_id, user_id, status, created_at, body)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![row.order_id, row.user_id, row.status, row.created_at, row.body],
                )
                .into_core()?;
                Ok(())
            })
            .await?;
        Ok(order)
    }

    async fn run_user_transaction(
        &self,
        user_id: &str,
        transform: UserOrderTransform,
    ) -> Result<UserOrderWrites> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut history: TransactionHistory =
                    documents::load(conn, &user_id, DocumentKind::Ledger)?.unwrap_or_default();
                let snapshot = UserOrderSnapshot {
                    user_id: user_id.clone(),
                    open_orders: open_orders_for_user(conn, &user_id)?,
                    details: documents::load::<PortfolioDetails>(
                        conn,
                        &user_id,
                        DocumentKind::PortfolioDetails,
                    )?,
                    history: history.clone(),
                };

                let writes = transform(&snapshot)?;
                if writes.is_empty() {
                    return Ok(writes);
                }

                for fill in &writes.fills {
                    close_order(conn, &user_id, &fill.order)?;
                    history.append_transaction(fill.transaction.clone());
                }
                if !writes.fills.is_empty() {
                    documents::store(conn, &user_id, DocumentKind::Ledger, &history)?;
                }
                if let Some(details) = &writes.details {
                    documents::store(conn, &user_id, DocumentKind::PortfolioDetails, details)?;
                }
                debug!(
                    "Committing {} fills for {}",
                    writes.fills.len(),
                    user_id
                );
                Ok(writes)
            })
            .await
    }
}
