//! Connection management and migrations.
//!
//! A single SQLite connection is shared behind a mutex: sync repository reads
//! lock it briefly, and the writer actor locks it for the duration of one
//! IMMEDIATE transaction.

pub mod write_actor;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info};
use papertrade_core::errors::{DatabaseError, Error, Result};
use rusqlite::{Connection, TransactionBehavior};

use crate::errors::{IntoCore, StorageError};
use crate::schema;

pub use write_actor::{spawn_writer, WriteHandle};

/// How long SQLite waits on a lock held by another process before failing
/// with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the database connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Database(DatabaseError::ConnectionFailed(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    )))
                })?;
            }
        }
        let conn = Connection::open(path).map_err(|e| {
            StorageError::ConnectionFailed(format!("{}: {}", path.display(), e))
        })?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .into_core()?;
        debug!("Journal mode for {}: {}", path.display(), mode);
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).into_core()?;
        conn.pragma_update(None, "foreign_keys", "ON").into_core()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "database connection mutex poisoned".to_string(),
            ))
        })
    }

    /// Runs a read-only closure against the connection.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }
}

/// Opens the database at `db_path` and brings the schema up to date.
pub fn init(db_path: &str) -> Result<Database> {
    info!("Opening database at {}", db_path);
    let db = Database::open(db_path)?;
    run_migrations(&db)?;
    Ok(db)
}

/// Applies every migration newer than the stored `user_version`.
pub fn run_migrations(db: &Database) -> Result<()> {
    let mut conn = db.lock()?;
    let current: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .into_core()?;
    let latest = schema::latest_version();
    if current >= latest {
        debug!("Schema is up to date (version {})", current);
        return Ok(());
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .into_core()?;
    for (index, migration) in schema::MIGRATIONS.iter().enumerate().skip(current as usize) {
        tx.execute_batch(migration).map_err(|e| {
            StorageError::MigrationFailed(format!("migration {} failed: {}", index + 1, e))
        })?;
    }
    tx.pragma_update(None, "user_version", latest).into_core()?;
    tx.commit().into_core()?;

    info!("Migrated schema from version {} to {}", current, latest);
    Ok(())
}
