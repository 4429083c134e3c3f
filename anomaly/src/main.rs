//! The anomaly consumer: evaluates the priority-ordered rule set against
//! each subject's rolling history, persisting and republishing anything it
//! flags.
//!
//! Unlike the ingest consumer there is no quarantine lane here — a
//! malformed record on the raw topic was already the ingest consumer's
//! problem to quarantine. This consumer only ever sees records it can
//! decode; anything else is logged and skipped without committing, so a
//! transient decode issue (there shouldn't be one, since ingest already
//! validated it) gets redelivered rather than silently dropped.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures::StreamExt;
use heartpulse_core::config::AppConfig;
use heartpulse_core::history::RollingHistory;
use heartpulse_core::wire;
use heartpulse_kafka::consumer::{self, commit_message};
use heartpulse_kafka::producer;
use heartpulse_runtime::metrics::{AnomalyMetrics, MetricsServer};
use heartpulse_runtime::shutdown::ShutdownFlag;
use rdkafka::consumer::StreamConsumer;
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, Producer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Anomaly publishes flush within a tighter bound than the pipeline's
/// default producer timeout — a slow republish shouldn't hold the
/// consumer's commit decision open indefinitely.
const ANOMALY_PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(%config, "anomaly consumer starting");

    let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.prometheus_port + 2).into();
    MetricsServer::new(metrics_addr).serve()?;

    let pool = heartpulse_store::get_pool(&config).await?;
    let consumer = consumer::build_consumer(
        &config,
        &config.kafka_consumer_group_anomaly,
        &[&config.kafka_topic_raw],
    )?;
    let anomaly_producer = producer::build_producer(&config)?;
    let thresholds = config.anomaly_thresholds();

    let shutdown = ShutdownFlag::default();
    shutdown.spawn_signal_listener();

    let mut history = RollingHistory::default();
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

        let started = Instant::now();

        let should_commit = process_message(
            &config,
            pool,
            &anomaly_producer,
            &thresholds,
            &mut history,
            &message,
        )
        .await;

        AnomalyMetrics::record_evaluated();
        AnomalyMetrics::record_batch_duration(started.elapsed());

        if should_commit {
            match commit_message(&consumer, &message) {
                Ok(()) => AnomalyMetrics::record_offset_committed(),
                Err(error) => tracing::error!(%error, "failed to commit offset"),
            }
        }
    }

    drop(stream);
    drop(consumer);

    if let Err(error) = anomaly_producer.flush(ANOMALY_PUBLISH_TIMEOUT) {
        tracing::error!(%error, "failed to flush anomaly producer during shutdown");
    }

    pool.close().await;

    tracing::info!("anomaly consumer shutting down");
    Ok(())
}

/// Decode → look up history → evaluate → (on a hit) persist and republish
/// → unconditionally append the reading to history → decide whether to
/// commit.
///
/// Returns `true` if the offset should be committed. The rolling-history
/// update happens before the commit decision and always happens, even if
/// persistence or republishing below fails — the in-memory window tracks
/// what was *seen*, not what was durably recorded.
async fn process_message(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    anomaly_producer: &FutureProducer,
    thresholds: &heartpulse_core::anomaly::AnomalyThresholds,
    history: &mut RollingHistory,
    message: &BorrowedMessage<'_>,
) -> bool {
    let raw = match message.payload_view::<str>() {
        Some(Ok(text)) => text,
        Some(Err(_)) => {
            tracing::error!("payload is not valid UTF-8, skipping without committing");
            return false;
        }
        None => {
            tracing::error!("message has no payload, skipping without committing");
            return false;
        }
    };

    let event = match wire::decode_heartbeat(raw) {
        Ok(event) => event,
        Err(error) => {
            tracing::error!(%error, "failed to decode heartbeat already validated by ingest, skipping without committing");
            return false;
        }
    };

    let recent_rates = history.recent_rates(event.customer_id());
    let anomaly = heartpulse_core::anomaly::evaluate(&event, &recent_rates, thresholds);

    let mut persisted_ok = true;

    if let Some(anomaly) = &anomaly {
        if let Err(error) = heartpulse_store::anomaly_repo::insert_anomaly(pool, anomaly).await {
            tracing::error!(%error, "failed to persist anomaly, offset will not be committed");
            persisted_ok = false;
        } else {
            AnomalyMetrics::record_anomaly(anomaly.anomaly_type.as_str(), anomaly.severity.as_str());

            match wire::encode_anomaly(anomaly) {
                Ok(encoded) => {
                    if let Err(error) = producer::publish(
                        anomaly_producer,
                        &config.kafka_topic_anomaly,
                        &anomaly.customer_id,
                        &encoded,
                        ANOMALY_PUBLISH_TIMEOUT,
                    )
                    .await
                    {
                        tracing::error!(%error, "failed to publish anomaly, offset will not be committed");
                        persisted_ok = false;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "failed to encode anomaly, offset will not be committed");
                    persisted_ok = false;
                }
            }
        }
    }

    history.record(event.customer_id(), event.heart_rate());

    persisted_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartpulse_testing::fixtures;

    #[test]
    fn rolling_history_records_every_reading_regardless_of_anomaly() {
        let mut history = RollingHistory::default();
        let event = fixtures::heartbeat("cust_00001", 72);
        let thresholds = heartpulse_core::anomaly::AnomalyThresholds::default();

        let recent = history.recent_rates(event.customer_id());
        let anomaly = heartpulse_core::anomaly::evaluate(&event, &recent, &thresholds);
        assert!(anomaly.is_none());

        history.record(event.customer_id(), event.heart_rate());
        assert_eq!(history.last("cust_00001"), Some(72));
    }

    #[test]
    fn spike_detection_consults_the_last_recorded_reading() {
        let mut history = RollingHistory::default();
        let thresholds = heartpulse_core::anomaly::AnomalyThresholds::default();

        let first = fixtures::heartbeat("cust_00001", 72);
        history.record(first.customer_id(), first.heart_rate());

        let second = fixtures::heartbeat("cust_00001", 110);
        let recent = history.recent_rates(second.customer_id());
        let anomaly = heartpulse_core::anomaly::evaluate(&second, &recent, &thresholds)
            .expect("spike should fire");
        assert_eq!(anomaly.anomaly_type, heartpulse_core::anomaly::AnomalyType::Spike);
    }
}
