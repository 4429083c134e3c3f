//! The ingest consumer: validates each raw heartbeat, persists it with its
//! checkpoint atomically, and routes anything it can't handle to one of
//! two quarantine lanes.
//!
//! See [`quarantine`] for the two quarantine publish helpers and
//! [`process_message`] for the POLL → PARSE → DOMAIN-CHECK → STORE-WRITE →
//! COMMIT state machine.

mod quarantine;

use std::net::SocketAddr;
use std::time::Instant;

use futures::StreamExt;
use heartpulse_core::config::AppConfig;
use heartpulse_core::wire::{self, WireError};
use heartpulse_kafka::consumer::{self, commit_message};
use heartpulse_kafka::producer::{self, DEFAULT_SEND_TIMEOUT};
use heartpulse_runtime::metrics::{IngestMetrics, MetricsServer};
use heartpulse_runtime::shutdown::ShutdownFlag;
use heartpulse_store::StoreError;
use rdkafka::consumer::StreamConsumer;
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, Producer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// The outcome of running one message through the state machine, used only
/// to decide whether to commit.
enum Outcome {
    Commit,
    DoNotCommit,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(%config, "ingest consumer starting");

    let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.prometheus_port + 1).into();
    MetricsServer::new(metrics_addr).serve()?;

    let pool = heartpulse_store::get_pool(&config).await?;
    let consumer = consumer::build_consumer(
        &config,
        &config.kafka_consumer_group_db,
        &[&config.kafka_topic_raw],
    )?;
    let quarantine_producer = producer::build_producer(&config)?;

    let shutdown = ShutdownFlag::default();
    shutdown.spawn_signal_listener();

    let mut stream = consumer.stream();
    while !shutdown.is_set() {
        let Some(message_result) = stream.next().await else {
            break;
        };

        let message = match message_result {
            Ok(message) => message,
            Err(error) => {
                tracing::error!(%error, "poll error");
                continue;
            }
        };

        IngestMetrics::record_polled(1);
        let started = Instant::now();

        let outcome = process_message(
            &config,
            pool,
            &quarantine_producer,
            &consumer,
            &message,
        )
        .await;

        IngestMetrics::record_batch_duration(started.elapsed());

        if matches!(outcome, Outcome::Commit) {
            match commit_message(&consumer, &message) {
                Ok(()) => IngestMetrics::record_offset_committed(),
                Err(error) => tracing::error!(%error, "failed to commit offset"),
            }
        }
    }

    drop(stream);
    drop(consumer);

    if let Err(error) = quarantine_producer.flush(DEFAULT_SEND_TIMEOUT) {
        tracing::error!(%error, "failed to flush quarantine producer during shutdown");
    }

    pool.close().await;

    tracing::info!("ingest consumer shutting down");
    Ok(())
}

/// Run one polled message through PARSE → DOMAIN-CHECK → STORE-WRITE,
/// returning whether the caller should commit its offset.
async fn process_message(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    quarantine_producer: &FutureProducer,
    consumer: &StreamConsumer,
    message: &BorrowedMessage<'_>,
) -> Outcome {
    let topic = message.topic().to_string();
    let partition = message.partition();
    let offset = message.offset();

    let raw = match message.payload_view::<str>() {
        Some(Ok(text)) => text.to_string(),
        Some(Err(_)) => {
            return quarantine_and_commit(
                quarantine_producer,
                &config.kafka_topic_invalid,
                "payload is not valid UTF-8",
                "",
            )
            .await;
        }
        None => {
            return quarantine_and_commit(
                quarantine_producer,
                &config.kafka_topic_invalid,
                "message has no payload",
                "",
            )
            .await;
        }
    };

    let event = match wire::decode_heartbeat(&raw) {
        Ok(event) => event,
        Err(error) => {
            let reason = describe_wire_error(&error);
            return quarantine_and_commit(quarantine_producer, &config.kafka_topic_invalid, &reason, &raw).await;
        }
    };

    if !event.within_soft_bounds(config.heart_rate_min, config.heart_rate_max) {
        let reason = format!(
            "heart_rate {} outside configured bounds {}..={}",
            event.heart_rate(),
            config.heart_rate_min,
            config.heart_rate_max
        );
        return quarantine_and_commit(quarantine_producer, &config.kafka_topic_invalid, &reason, &raw).await;
    }

    match heartpulse_store::ingest_write::write_heartbeat_and_checkpoint(
        pool,
        &event,
        "valid",
        &config.kafka_consumer_group_db,
        &topic,
        partition,
        offset,
    )
    .await
    {
        Ok(()) => Outcome::Commit,
        Err(store_error) => {
            let reason = describe_store_error(&store_error);
            if let Err(error) =
                quarantine::quarantine_processing(quarantine_producer, &config.kafka_topic_dlq, &reason, &raw).await
            {
                tracing::error!(%error, "failed to publish to dead-letter topic");
            } else {
                IngestMetrics::record_dlq_routed();
            }
            tracing::error!(error = %store_error, "store write failed, offset will not be committed");
            Outcome::DoNotCommit
        }
    }
}

async fn quarantine_and_commit(
    producer: &FutureProducer,
    topic: &str,
    reason: &str,
    raw: &str,
) -> Outcome {
    match quarantine::quarantine_validation(producer, topic, reason, raw).await {
        Ok(()) => {
            IngestMetrics::record_invalid_routed();
            Outcome::Commit
        }
        Err(error) => {
            tracing::error!(%error, "failed to publish to invalid-events topic, offset will not be committed");
            Outcome::DoNotCommit
        }
    }
}

fn describe_wire_error(error: &WireError) -> String {
    match error {
        WireError::Json(e) => format!("malformed JSON: {e}"),
        WireError::Invalid(e) => format!("invalid event: {e}"),
    }
}

fn describe_store_error(error: &StoreError) -> String {
    format!("store write failed: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartpulse_core::event::EventError;

    #[test]
    fn describes_malformed_json_errors() {
        let raw = "{not json";
        let error = wire::decode_heartbeat(raw).expect_err("malformed");
        assert!(describe_wire_error(&error).starts_with("malformed JSON"));
    }

    #[test]
    fn describes_invalid_event_errors() {
        let error = WireError::Invalid(EventError::EmptyCustomerId);
        assert_eq!(describe_wire_error(&error), "invalid event: customer_id cannot be empty");
    }

    #[test]
    fn describes_store_errors_with_their_display_text() {
        let error = StoreError::PoolExhausted;
        assert_eq!(describe_store_error(&error), format!("store write failed: {error}"));
    }
}
