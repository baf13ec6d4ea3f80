//! Database schema, applied as numbered migrations tracked in `PRAGMA user_version`.
//!
//! Per-user documents (ledger, portfolio details, growth series) are stored
//! as JSON bodies keyed by `(user_id, kind)`. Orders get their own table so
//! the execution pipeline can select OPEN orders across users.

pub const MIGRATIONS: &[&str] = &[
    // 1: initial schema
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        user_id TEXT PRIMARY KEY NOT NULL,
        starting_cash TEXT,
        last_portfolio_update TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_accounts_last_update
        ON accounts (last_portfolio_update);

    CREATE TABLE IF NOT EXISTS user_documents (
        user_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, kind)
    );

    CREATE TABLE IF NOT EXISTS outstanding_orders (
        order_id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_orders_status
        ON outstanding_orders (status, created_at);
    CREATE INDEX IF NOT EXISTS idx_orders_user
        ON outstanding_orders (user_id, created_at);
    "#,
];

/// Version reached once every migration is applied.
pub fn latest_version() -> i32 {
    MIGRATIONS.len() as i32
}
