/// Decimal places kept for money values written to the portfolio state.
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal places used for fees.
pub const FEE_DECIMAL_PRECISION: u32 = 2;

/// Default starting cash for a new or reset account.
pub const DEFAULT_STARTING_CASH: i64 = 30_000;

/// Default flat fee charged per executed order.
pub const DEFAULT_FLAT_FEE: i64 = 2;

/// Users processed per nightly update invocation.
pub const DEFAULT_NIGHTLY_BATCH_SIZE: usize = 150;

/// Concurrent per-user units of work inside one invocation.
pub const DEFAULT_USER_CONCURRENCY: usize = 8;

/// Symbols fetched together before pausing for the provider's rate limit.
pub const DEFAULT_HISTORICAL_BATCH_SIZE: usize = 5;

/// Pause between historical price batches, in seconds.
pub const DEFAULT_HISTORICAL_BATCH_DELAY_SECS: u64 = 20;

/// Attempts for one user transaction before the user is skipped this run.
pub const DEFAULT_TRANSACTION_MAX_ATTEMPTS: u32 = 5;

/// Days of closes fetched before an incremental growth window, so the first
/// new point can carry a close forward.
pub const GROWTH_PRICE_LOOKBACK_DAYS: i64 = 7;
