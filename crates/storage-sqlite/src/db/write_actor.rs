use std::any::Any;
use std::thread;
use std::time::Duration;

use log::{error, warn};
use papertrade_core::errors::{DatabaseError, Error, Result};
use rusqlite::{Connection, TransactionBehavior};
use tokio::sync::{mpsc, oneshot};

use super::Database;
use crate::errors::StorageError;

// A write job receives the connection inside an open IMMEDIATE transaction.
// Jobs are `FnMut` because a job whose transaction hit SQLITE_BUSY is run
// again from the start.
type Job<T> = Box<dyn FnMut(&Connection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

const BUSY_BACKOFF: Duration = Duration::from_millis(50);

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    // The Box<dyn Any + Send> erases each job's return type.
    tx: mpsc::Sender<(ErasedJob, Reply)>,
}

impl WriteHandle {
    /// Executes a job on the writer's connection inside an IMMEDIATE
    /// transaction. The transaction commits when the job returns `Ok` and
    /// rolls back otherwise.
    pub async fn exec<F, T>(&self, mut job: F) -> Result<T>
    where
        F: FnMut(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_stopped())?;

        let boxed = ret_rx.await.map_err(|_| writer_stopped())??;
        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "writer actor returned an unexpected result type".to_string(),
            ))
        })
    }
}

fn writer_stopped() -> Error {
    Error::Database(DatabaseError::ConnectionFailed(
        "database writer has stopped".to_string(),
    ))
}

/// Starts the single writer. It runs on a dedicated thread because every
/// SQLite call blocks, and processes jobs serially so there is never more
/// than one write transaction open on this process's connection.
///
/// A transaction that fails with `SQLITE_BUSY` (another process holds the
/// lock past the busy timeout) is retried up to `max_attempts` times.
pub fn spawn_writer(db: Database, max_attempts: u32) -> Result<WriteHandle> {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, Reply)>(1024);
    let max_attempts = max_attempts.max(1);

    thread::Builder::new()
        .name("papertrade-sqlite-writer".to_string())
        .spawn(move || {
            while let Some((mut job, reply_tx)) = rx.blocking_recv() {
                let result = run_with_retry(&db, &mut job, max_attempts);
                // The requester may have gone away; nothing to do then.
                let _ = reply_tx.send(result);
            }
        })
        .map_err(|e| StorageError::ConnectionFailed(format!("cannot start writer: {}", e)))?;

    Ok(WriteHandle { tx })
}

fn run_with_retry(
    db: &Database,
    job: &mut ErasedJob,
    max_attempts: u32,
) -> Result<Box<dyn Any + Send + 'static>> {
    let mut attempt = 1;
    loop {
        let outcome = match db.lock() {
            Ok(mut conn) => run_immediate(&mut conn, job),
            Err(e) => return Err(e),
        };
        match outcome {
            Err(e) if e.is_busy() && attempt < max_attempts => {
                warn!(
                    "Write transaction busy (attempt {}/{}), retrying: {}",
                    attempt, max_attempts, e
                );
                thread::sleep(BUSY_BACKOFF * attempt);
                attempt += 1;
            }
            Err(e) => {
                if e.is_busy() {
                    error!("Write transaction gave up after {} attempts: {}", attempt, e);
                }
                return Err(e.into());
            }
            Ok(value) => return Ok(value),
        }
    }
}

fn run_immediate(
    conn: &mut Connection,
    job: &mut ErasedJob,
) -> std::result::Result<Box<dyn Any + Send + 'static>, StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Dropping `tx` on the error path rolls back.
    let value = job(&*tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use crate::errors::IntoCore;

    fn database() -> Database {
        let db = Database::open_in_memory().unwrap();
        run_migrations(&db).unwrap();
        db
    }

    fn count_accounts(db: &Database) -> i64 {
        db.read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
                .into_core()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_exec_commits_and_returns_value() {
        let db = database();
        let writer = spawn_writer(db.clone(), 3).unwrap();

        let inserted = writer
            .exec(|conn| {
                conn.execute(
                    "INSERT INTO accounts (user_id, created_at) VALUES ('u1', '2024-01-02T00:00:00Z')",
                    [],
                )
                .into_core()
            })
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(count_accounts(&db), 1);
    }

    #[tokio::test]
    async fn test_failed_job_rolls_back() {
        let db = database();
        let writer = spawn_writer(db.clone(), 3).unwrap();

        let result: Result<()> = writer
            .exec(|conn| {
                conn.execute(
                    "INSERT INTO accounts (user_id, created_at) VALUES ('u1', '2024-01-02T00:00:00Z')",
                    [],
                )
                .into_core()?;
                Err(Error::Repository("abort".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Repository(_))));
        assert_eq!(count_accounts(&db), 0);
    }
}
