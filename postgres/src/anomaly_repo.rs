//! Repository for the `anomalies` table.

use heartpulse_core::anomaly::AnomalyEvent;
use heartpulse_runtime::retry::{RetryPolicy, retry_with_predicate};
use sqlx::PgPool;

use crate::errors::StoreError;

/// Insert one anomaly row. Plain insert, no uniqueness key — a duplicate
/// evaluation (e.g. after an uncommitted-offset redelivery) produces a
/// second row rather than being deduplicated.
///
/// # Errors
///
/// Returns [`StoreError::Permanent`] for anything other than a transient
/// connectivity fault, surfaced after the retry budget is exhausted.
pub async fn insert_anomaly(pool: &PgPool, anomaly: &AnomalyEvent) -> Result<(), StoreError> {
    let details = serde_json::to_value(&anomaly.details).map_err(|e| {
        StoreError::Permanent(sqlx::Error::Decode(Box::new(e)))
    })?;

    retry_with_predicate(
        RetryPolicy::default(),
        || insert_anomaly_once(pool, anomaly, &details),
        StoreError::is_transient,
    )
    .await
}

async fn insert_anomaly_once(
    pool: &PgPool,
    anomaly: &AnomalyEvent,
    details: &serde_json::Value,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO anomalies (
            event_id, customer_id, event_time, heart_rate, anomaly_type, severity, details
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(anomaly.event_id)
    .bind(&anomaly.customer_id)
    .bind(anomaly.timestamp)
    .bind(anomaly.heart_rate)
    .bind(anomaly.anomaly_type.as_str())
    .bind(anomaly.severity.as_str())
    .bind(details)
    .execute(pool)
    .await
    .map_err(StoreError::classify)?;

    Ok(())
}

/// Count of anomaly rows recorded for `customer_id`, used by integration
/// tests to assert end-to-end delivery.
///
/// # Errors
///
/// Returns [`StoreError::classify`]'d failures from the underlying query.
pub async fn count_for_customer(pool: &PgPool, customer_id: &str) -> Result<i64, StoreError> {
    let (count,): (i64,) = sqlx::query_as(
        r"SELECT COUNT(*) FROM anomalies WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await
    .map_err(StoreError::classify)?;

    Ok(count)
}
