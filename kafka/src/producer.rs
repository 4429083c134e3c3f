//! The durable-log producer factory and its one publish primitive.
//!
//! Every producer in the pipeline (simulator, ingest quarantine lanes,
//! anomaly publisher) shares the same delivery contract: all-replica acks,
//! idempotent publish, and a bounded internal retry count, so a duplicate
//! on the wire can only come from the producer's own retry, never a
//! double-send from caller code.

use std::time::Duration;

use heartpulse_core::config::AppConfig;
use heartpulse_runtime::metrics::ProducerMetrics;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::errors::KafkaError;

/// Default producer send timeout, used when a caller has no tighter bound.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a producer honoring the pipeline's delivery guarantees:
/// all-replica acknowledgement, idempotent publish, up to 10 internal
/// retries, a batching window of at most 5 ms, batches capped at 64 KiB,
/// `lz4` compression, and an in-flight pipeline depth of 5 (safe under
/// idempotence).
///
/// # Errors
///
/// Returns [`KafkaError::ClientCreation`] if the client library rejects the
/// configuration (e.g. an unparseable `bootstrap.servers`).
pub fn build_producer(config: &AppConfig) -> Result<FutureProducer, KafkaError> {
    ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("acks", "all")
        .set("enable.idempotence", "true")
        .set("message.send.max.retries", "10")
        .set("linger.ms", "5")
        .set("batch.size", "65536")
        .set("compression.type", "lz4")
        .set("max.in.flight.requests.per.connection", "5")
        .create()
        .map_err(|source| KafkaError::ClientCreation {
            kind: "producer",
            source,
        })
}

/// Publish one UTF-8 record, keyed for partition affinity, and wait for its
/// delivery report.
///
/// # Errors
///
/// Returns [`KafkaError::Publish`] if the broker never acknowledges the
/// record within `timeout` or rejects it outright (after the producer's own
/// internal retries are exhausted).
pub async fn publish(
    producer: &FutureProducer,
    topic: &str,
    key: &str,
    payload: &str,
    timeout: Duration,
) -> Result<(i32, i64), KafkaError> {
    let record = FutureRecord::to(topic).payload(payload).key(key);

    match producer.send(record, Timeout::After(timeout)).await {
        Ok((partition, offset)) => {
            ProducerMetrics::record_success();
            tracing::debug!(topic, partition, offset, "published record");
            Ok((partition, offset))
        }
        Err((source, _)) => {
            ProducerMetrics::record_error();
            tracing::error!(topic, error = %source, "failed to publish record");
            Err(KafkaError::Publish {
                topic: topic.to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::from_env().expect("defaults are valid")
    }

    #[test]
    fn build_producer_accepts_default_config() {
        let config = test_config();
        let producer = build_producer(&config);
        assert!(producer.is_ok(), "producer config should be well-formed even without a reachable broker");
    }
}
