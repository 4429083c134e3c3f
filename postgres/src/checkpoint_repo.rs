//! Repository for the `ingest_checkpoint` table.
//!
//! One row per `(consumer_group, topic, partition)`, upserted on every
//! successful commit so a restarted consumer resumes from the last durably
//! recorded offset rather than relying solely on the broker's committed
//! offsets.

use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::StoreError;

/// Upsert the checkpoint row for one partition, within an already-open
/// transaction so it commits atomically with the write it accompanies.
///
/// # Errors
///
/// Returns [`StoreError::classify`]'d failures from the underlying query.
pub async fn upsert_checkpoint(
    tx: &mut Transaction<'_, Postgres>,
    consumer_group: &str,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO ingest_checkpoint (consumer_group, topic, partition, last_offset, updated_at)
        VALUES ($1, $2, $3, $4, now())
        ON CONFLICT (consumer_group, topic, partition)
        DO UPDATE SET last_offset = EXCLUDED.last_offset, updated_at = now()
        ",
    )
    .bind(consumer_group)
    .bind(topic)
    .bind(partition)
    .bind(offset)
    .execute(&mut **tx)
    .await
    .map_err(StoreError::classify)?;

    Ok(())
}

/// The last durably recorded offset for one partition, if any.
///
/// # Errors
///
/// Returns [`StoreError::classify`]'d failures from the underlying query.
pub async fn last_offset(
    pool: &PgPool,
    consumer_group: &str,
    topic: &str,
    partition: i32,
) -> Result<Option<i64>, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as(
        r"
        SELECT last_offset FROM ingest_checkpoint
        WHERE consumer_group = $1 AND topic = $2 AND partition = $3
        ",
    )
    .bind(consumer_group)
    .bind(topic)
    .bind(partition)
    .fetch_optional(pool)
    .await
    .map_err(StoreError::classify)?;

    Ok(row.map(|(offset,)| offset))
}
