//! Process-wide connection pool, lazily initialized on first use.

use std::time::Duration;

use heartpulse_core::config::AppConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::OnceCell;

use crate::errors::StoreError;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Borrow-timeout applied to every connection acquisition.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Return the process-wide pool, building it on the first call.
///
/// # Errors
///
/// Returns [`StoreError::Transient`] if the pool cannot be built (e.g. the
/// database is unreachable at startup).
pub async fn get_pool(config: &AppConfig) -> Result<&'static PgPool, StoreError> {
    POOL.get_or_try_init(|| build_pool(config)).await
}

async fn build_pool(config: &AppConfig) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.db_pool_max)
        .min_connections(config.db_pool_min)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url())
        .await
        .map_err(StoreError::classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_timeout_matches_specification() {
        assert_eq!(ACQUIRE_TIMEOUT, Duration::from_secs(30));
    }
}
