//! Per-user JSON documents.
//!
//! Each user owns at most one document per [`DocumentKind`]. Saves overwrite
//! the whole body; additive appends are read-merge-write inside the writer's
//! transaction.

use chrono::Utc;
use papertrade_core::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{IntoCore, StorageError};
use crate::utils::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `TransactionHistory`
    Ledger,
    /// `PortfolioDetails`
    PortfolioDetails,
    /// `Vec<PortfolioGrowthPoint>`
    Growth,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Ledger => "ledger",
            DocumentKind::PortfolioDetails => "portfolio_details",
            DocumentKind::Growth => "growth",
        }
    }
}

pub fn load<T: DeserializeOwned>(
    conn: &Connection,
    user_id: &str,
    kind: DocumentKind,
) -> Result<Option<T>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM user_documents WHERE user_id = ?1 AND kind = ?2",
            params![user_id, kind.as_str()],
            |row| row.get(0),
        )
        .optional()
        .into_core()?;

    match body {
        Some(body) => {
            let value = serde_json::from_str(&body).map_err(StorageError::from)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn store<T: Serialize>(
    conn: &Connection,
    user_id: &str,
    kind: DocumentKind,
    value: &T,
) -> Result<()> {
    let body = serde_json::to_string(value).map_err(StorageError::from)?;
    conn.execute(
        "INSERT INTO user_documents (user_id, kind, body, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, kind) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![user_id, kind.as_str(), body, format_timestamp(Utc::now())],
    )
    .into_core()?;
    Ok(())
}

pub fn remove(conn: &Connection, user_id: &str, kind: DocumentKind) -> Result<()> {
    conn.execute(
        "DELETE FROM user_documents WHERE user_id = ?1 AND kind = ?2",
        params![user_id, kind.as_str()],
    )
    .into_core()?;
    Ok(())
}
