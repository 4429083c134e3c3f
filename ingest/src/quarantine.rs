//! Publishing a message to one of the two quarantine lanes.

use heartpulse_core::invalid::InvalidEvent;
use heartpulse_core::wire::{self, WireError};
use heartpulse_kafka::KafkaError;
use heartpulse_kafka::producer::{self, DEFAULT_SEND_TIMEOUT};
use rdkafka::producer::FutureProducer;

/// Failure preparing or sending a quarantine record.
#[derive(Debug, thiserror::Error)]
pub enum QuarantineError {
    /// The [`InvalidEvent`] envelope itself failed to serialize — should
    /// not happen for well-formed strings, but surfaced rather than
    /// panicked on.
    #[error("failed to encode invalid-event envelope: {0}")]
    Encode(#[from] WireError),

    /// The publish to the quarantine topic failed.
    #[error("failed to publish to quarantine topic: {0}")]
    Publish(#[from] KafkaError),
}

/// Wrap `raw` in a VALIDATION-classified envelope and publish it to the
/// invalid-events topic.
///
/// # Errors
///
/// Returns [`QuarantineError`] if encoding or publishing fails.
pub async fn quarantine_validation(
    producer: &FutureProducer,
    topic: &str,
    error: &str,
    raw: &str,
) -> Result<(), QuarantineError> {
    let envelope = InvalidEvent::validation(error, raw);
    let encoded = wire::encode_invalid(&envelope)?;
    producer::publish(producer, topic, "", &encoded, DEFAULT_SEND_TIMEOUT).await?;
    Ok(())
}

/// Wrap `raw` in a PROCESSING-classified envelope and publish it to the
/// dead-letter topic.
///
/// # Errors
///
/// Returns [`QuarantineError`] if encoding or publishing fails.
pub async fn quarantine_processing(
    producer: &FutureProducer,
    topic: &str,
    error: &str,
    raw: &str,
) -> Result<(), QuarantineError> {
    let envelope = InvalidEvent::processing(error, raw);
    let encoded = wire::encode_invalid(&envelope)?;
    producer::publish(producer, topic, "", &encoded, DEFAULT_SEND_TIMEOUT).await?;
    Ok(())
}
