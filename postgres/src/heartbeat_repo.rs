//! Repository for the `heartbeat_events` table.

use chrono::{DateTime, Utc};
use heartpulse_core::event::HeartbeatEvent;
use heartpulse_runtime::retry::{RetryPolicy, retry_with_predicate};
use sqlx::PgPool;

use crate::errors::StoreError;

/// Insert one heartbeat row, wrapped in the shared retry policy.
///
/// Idempotent on `(customer_id, event_id)`: a duplicate insert (e.g. after a
/// crash-restart redelivery) is a silent no-op, not an error.
///
/// # Errors
///
/// Returns [`StoreError::Permanent`] for anything other than a transient
/// connectivity fault, surfaced after the retry budget is exhausted.
pub async fn insert_heartbeat(
    pool: &PgPool,
    event: &HeartbeatEvent,
    quality_flag: &str,
    source_topic: &str,
    source_partition: i32,
    source_offset: i64,
) -> Result<(), StoreError> {
    let payload = serde_json::json!({
        "event_id": event.event_id(),
        "customer_id": event.customer_id(),
        "timestamp": event.timestamp(),
        "heart_rate": event.heart_rate(),
    });

    retry_with_predicate(
        RetryPolicy::default(),
        || insert_heartbeat_once(pool, event, quality_flag, source_topic, source_partition, source_offset, &payload),
        StoreError::is_transient,
    )
    .await
}

async fn insert_heartbeat_once(
    pool: &PgPool,
    event: &HeartbeatEvent,
    quality_flag: &str,
    source_topic: &str,
    source_partition: i32,
    source_offset: i64,
    payload: &serde_json::Value,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO heartbeat_events (
            event_id, customer_id, event_time, heart_rate, quality_flag,
            source_topic, source_partition, source_offset, payload
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (customer_id, event_id) DO NOTHING
        ",
    )
    .bind(event.event_id())
    .bind(event.customer_id())
    .bind(event.timestamp())
    .bind(event.heart_rate())
    .bind(quality_flag)
    .bind(source_topic)
    .bind(source_partition)
    .bind(source_offset)
    .bind(payload)
    .execute(pool)
    .await
    .map_err(StoreError::classify)?;

    Ok(())
}

/// The event time of the most recently inserted row for `customer_id`, used
/// only by integration tests and operational debugging.
///
/// # Errors
///
/// Returns [`StoreError::classify`]'d failures from the underlying query.
pub async fn latest_event_time(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
        r"
        SELECT event_time FROM heartbeat_events
        WHERE customer_id = $1
        ORDER BY event_time DESC
        LIMIT 1
        ",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await
    .map_err(StoreError::classify)?;

    Ok(row.map(|(t,)| t))
}
