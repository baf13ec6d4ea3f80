//! Database model for outstanding orders.
//!
//! The full order is kept as a JSON body; `user_id`, `status` and
//! `created_at` are duplicated into columns for selection and ordering.

use papertrade_core::orders::OutstandingOrder;
use papertrade_core::Result;
use rusqlite::Row;

use crate::errors::StorageError;
use crate::utils::format_timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDB {
    pub order_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: String,
    pub body: String,
}

impl OrderDB {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_id: row.get("order_id")?,
            user_id: row.get("user_id")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            body: row.get("body")?,
        })
    }

    pub fn from_order(order: &OutstandingOrder) -> Result<Self> {
        Ok(Self {
            order_id: order.order_id.clone(),
            user_id: order.user_id.clone(),
            status: order.status.as_str().to_string(),
            created_at: format_timestamp(order.created_at),
            body: serde_json::to_string(order).map_err(StorageError::from)?,
        })
    }

    pub fn into_order(self) -> Result<OutstandingOrder> {
        Ok(serde_json::from_str(&self.body).map_err(StorageError::from)?)
    }
}
