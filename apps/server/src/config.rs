use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use papertrade_core::orders::FeeSchedule;
use papertrade_core::settings::EngineSettings;
use rust_decimal::Decimal;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8088";
const DEFAULT_DB_PATH: &str = "./db/papertrade.db";
const DEFAULT_QUOTE_API_URL: &str = "http://127.0.0.1:9090";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_QUOTE_REQUESTS_PER_MINUTE: u32 = 60;
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub quote_api_url: String,
    pub quote_api_key: Option<String>,
    /// Timeout of a single call to the quote service.
    pub request_timeout: Duration,
    pub quote_requests_per_minute: u32,
    /// Upper bound on one HTTP request, batch jobs included.
    pub job_timeout: Duration,
    pub engine: EngineSettings,
}

impl Config {
    /// Reads `PT_*` variables, falling back to defaults for unset ones.
    /// A variable that is set but unparsable is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = EngineSettings::default();
        let fee_schedule = FeeSchedule {
            flat: env_or("PT_FEE_FLAT", defaults.fee_schedule.flat)?,
            percentage: env_or("PT_FEE_PERCENTAGE", defaults.fee_schedule.percentage)?,
        };
        let engine = EngineSettings {
            starting_cash: env_or::<Decimal>("PT_STARTING_CASH", defaults.starting_cash)?,
            fee_schedule,
            nightly_batch_size: env_or("PT_NIGHTLY_BATCH_SIZE", defaults.nightly_batch_size)?,
            user_concurrency: env_or("PT_USER_CONCURRENCY", defaults.user_concurrency)?,
            historical_batch_size: env_or(
                "PT_HISTORICAL_BATCH_SIZE",
                defaults.historical_batch_size,
            )?,
            historical_batch_delay_secs: env_or(
                "PT_HISTORICAL_BATCH_DELAY_SECS",
                defaults.historical_batch_delay_secs,
            )?,
            transaction_max_attempts: env_or(
                "PT_TRANSACTION_MAX_ATTEMPTS",
                defaults.transaction_max_attempts,
            )?,
        };
        if engine.user_concurrency == 0 || engine.historical_batch_size == 0 {
            anyhow::bail!("PT_USER_CONCURRENCY and PT_HISTORICAL_BATCH_SIZE must be at least 1");
        }

        Ok(Self {
            listen_addr: env_or("PT_LISTEN_ADDR", DEFAULT_LISTEN_ADDR.parse()?)?,
            db_path: std::env::var("PT_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            quote_api_url: std::env::var("PT_QUOTE_API_URL")
                .unwrap_or_else(|_| DEFAULT_QUOTE_API_URL.to_string()),
            quote_api_key: std::env::var("PT_QUOTE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            request_timeout: Duration::from_millis(env_or(
                "PT_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?),
            quote_requests_per_minute: env_or(
                "PT_QUOTE_REQUESTS_PER_MINUTE",
                DEFAULT_QUOTE_REQUESTS_PER_MINUTE,
            )?,
            job_timeout: Duration::from_secs(env_or(
                "PT_JOB_TIMEOUT_SECS",
                DEFAULT_JOB_TIMEOUT_SECS,
            )?),
            engine,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
