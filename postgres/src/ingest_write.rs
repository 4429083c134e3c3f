//! The ingest consumer's atomic write: one heartbeat row plus its
//! checkpoint update, committed together on a single borrowed connection.

use heartpulse_core::event::HeartbeatEvent;
use heartpulse_runtime::retry::{RetryPolicy, retry_with_predicate};
use sqlx::PgPool;

use crate::errors::StoreError;

/// Insert the heartbeat row and upsert the partition checkpoint inside one
/// transaction, retried as a unit on transient failure.
///
/// # Errors
///
/// Returns [`StoreError::Permanent`] for anything other than a transient
/// connectivity fault, surfaced after the retry budget is exhausted.
#[allow(clippy::too_many_arguments)]
pub async fn write_heartbeat_and_checkpoint(
    pool: &PgPool,
    event: &HeartbeatEvent,
    quality_flag: &str,
    consumer_group: &str,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<(), StoreError> {
    let payload = serde_json::json!({
        "event_id": event.event_id(),
        "customer_id": event.customer_id(),
        "timestamp": event.timestamp(),
        "heart_rate": event.heart_rate(),
    });

    retry_with_predicate(
        RetryPolicy::default(),
        || write_once(pool, event, quality_flag, consumer_group, topic, partition, offset, &payload),
        StoreError::is_transient,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn write_once(
    pool: &PgPool,
    event: &HeartbeatEvent,
    quality_flag: &str,
    consumer_group: &str,
    topic: &str,
    partition: i32,
    offset: i64,
    payload: &serde_json::Value,
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await.map_err(StoreError::classify)?;

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
    .bind(topic)
    .bind(partition)
    .bind(offset)
    .bind(payload)
    .execute(&mut *tx)
    .await
    .map_err(StoreError::classify)?;

    crate::checkpoint_repo::upsert_checkpoint(&mut tx, consumer_group, topic, partition, offset)
        .await?;

    tx.commit().await.map_err(StoreError::classify)?;

    heartpulse_runtime::metrics::IngestMetrics::record_row_inserted();

    Ok(())
}
