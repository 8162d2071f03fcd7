//! Connection pool management for the PostgreSQL storage backend.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, instrument, warn};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};

/// Type alias for PostgreSQL pool options.
pub type PgPoolOptions = PoolOptions<Postgres>;

/// Upper bound for the delay between connection attempts.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(10);

fn pool_options(config: &PostgresConfig) -> PgPoolOptions {
    let min_connections = config
        .min_connections
        .unwrap_or(config.pool_size / 4)
        .max(1)
        .min(config.pool_size);

    let max_lifetime_secs = config.max_lifetime_secs.unwrap_or(1800);

    let mut options = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
        .max_lifetime(Duration::from_secs(max_lifetime_secs))
        .test_before_acquire(false);

    if let Some(idle_timeout) = config.idle_timeout_ms {
        options = options.idle_timeout(Duration::from_millis(idle_timeout));
    }

    options
}

/// Creates a new PostgreSQL connection pool from the given configuration.
///
/// Fails on the first unsuccessful attempt; see [`connect_with_retry`].
#[instrument(skip(config), fields(url = %mask_password(&config.url)))]
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    info!(
        pool_size = config.pool_size,
        min_connections = ?config.min_connections,
        connect_timeout_ms = config.connect_timeout_ms,
        max_lifetime_secs = ?config.max_lifetime_secs,
        "Creating PostgreSQL connection pool"
    );

    let pool = pool_options(config).connect(&config.url).await?;

    debug!("PostgreSQL connection pool created successfully");

    Ok(pool)
}

/// Creates a pool, retrying with exponential backoff.
///
/// Makes at most `connect_retries + 1` attempts and returns the last error
/// when all of them fail.
pub async fn connect_with_retry(config: &PostgresConfig) -> Result<PgPool> {
    let mut delay = Duration::from_millis(config.retry_backoff_ms);
    let mut attempt = 0u32;

    loop {
        match create_pool(config).await {
            Ok(pool) => {
                info!(attempt, "Connected to PostgreSQL");
                return Ok(pool);
            }
            Err(e) if attempt < config.connect_retries => {
                attempt += 1;
                warn!(
                    error = %e,
                    attempt,
                    max_retries = config.connect_retries,
                    retry_in_ms = delay.as_millis() as u64,
                    "PostgreSQL connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_BACKOFF);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Creates a pool that opens connections on first use.
///
/// Only the URL is validated here; an unreachable server surfaces as an
/// error on each query instead.
pub fn create_lazy_pool(config: &PostgresConfig) -> Result<PgPool> {
    pool_options(config)
        .connect_lazy(&config.url)
        .map_err(|e| PostgresError::config(format!("invalid connection URL: {e}")))
}

/// Tests the connection to the database.
#[instrument(skip(pool))]
pub async fn test_connection(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(PostgresError::from)?;

    debug!("Database connection test successful");

    Ok(())
}

/// Masks the password in a database URL for logging.
pub fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****{}", &url[..colon_pos], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
