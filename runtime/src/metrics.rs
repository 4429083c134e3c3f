//! Prometheus metrics for the ingest and anomaly consumers.
//!
//! # Example
//!
//! ```rust,no_run
//! use heartpulse_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.serve()?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the metrics exporter.
    #[error("failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the metrics exporter.
    #[error("failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the histogram bucket configuration
    /// is rejected, or [`MetricsError::Install`] if a recorder is already
    /// installed for this process (other than in tests, where a second
    /// installation is tolerated and logged).
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "metrics server started");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("metrics recorder already initialized, skipping");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// The handle used to render metrics, once [`start`](Self::start) has
    /// succeeded on this instance.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }

    /// Bind an HTTP listener at `addr` that serves the rendered Prometheus
    /// text format on every request — the `/metrics` endpoint each binary
    /// exposes.
    ///
    /// Must be called from within a Tokio runtime: the listener task is
    /// spawned onto the current runtime and this method returns once the
    /// spawn succeeds, not once the socket is accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the histogram bucket configuration
    /// is rejected, or [`MetricsError::Install`] if the listener cannot be
    /// bound (e.g. the port is already in use).
    pub fn serve(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        builder.install().map_err(|e| MetricsError::Install(e.to_string()))?;

        tracing::info!(addr = %self.addr, "metrics endpoint listening");
        Ok(())
    }
}

fn register_metrics() {
    describe_counter!(
        "ingest_messages_polled_total",
        "Total number of raw heartbeat messages polled from the ingest topic"
    );
    describe_counter!(
        "ingest_rows_inserted_total",
        "Total number of heartbeat rows written to the store"
    );
    describe_counter!(
        "ingest_invalid_routed_total",
        "Total number of messages routed to the invalid-events topic"
    );
    describe_counter!(
        "ingest_dlq_routed_total",
        "Total number of messages routed to the dead-letter topic after exhausting retries"
    );
    describe_counter!(
        "ingest_offsets_committed_total",
        "Total number of partition offsets committed by the ingest consumer"
    );
    describe_histogram!(
        "ingest_batch_duration_seconds",
        "Time taken to process one polled batch end to end"
    );

    describe_counter!(
        "anomaly_events_evaluated_total",
        "Total number of heartbeat events run through the rule engine"
    );
    describe_counter!(
        "anomalies_total",
        "Total number of anomalies detected, labeled by type and severity"
    );
    describe_counter!(
        "anomaly_offsets_committed_total",
        "Total number of partition offsets committed by the anomaly consumer"
    );
    describe_histogram!(
        "anomaly_batch_duration_seconds",
        "Time taken to process one polled batch end to end"
    );

    describe_counter!(
        "kafka_produce_success_total",
        "Total number of messages acknowledged by the broker"
    );
    describe_counter!(
        "kafka_produce_errors_total",
        "Total number of produce failures"
    );

    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!(
        "retry_successes_total",
        "Total number of operations that succeeded after at least one retry"
    );
    describe_counter!(
        "retry_exhausted_total",
        "Total number of operations that failed after exhausting all retries"
    );
}

/// Ingest consumer metrics recorder.
pub struct IngestMetrics;

impl IngestMetrics {
    /// Record that `count` messages were polled in one batch.
    pub fn record_polled(count: u64) {
        counter!("ingest_messages_polled_total").increment(count);
    }

    /// Record a successful heartbeat insert.
    pub fn record_row_inserted() {
        counter!("ingest_rows_inserted_total").increment(1);
    }

    /// Record a message routed to the invalid-events topic.
    pub fn record_invalid_routed() {
        counter!("ingest_invalid_routed_total").increment(1);
    }

    /// Record a message routed to the dead-letter topic.
    pub fn record_dlq_routed() {
        counter!("ingest_dlq_routed_total").increment(1);
    }

    /// Record a committed offset.
    pub fn record_offset_committed() {
        counter!("ingest_offsets_committed_total").increment(1);
    }

    /// Record the wall-clock time taken to process one batch.
    pub fn record_batch_duration(duration: Duration) {
        histogram!("ingest_batch_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Anomaly consumer metrics recorder.
pub struct AnomalyMetrics;

impl AnomalyMetrics {
    /// Record that an event was run through the rule engine.
    pub fn record_evaluated() {
        counter!("anomaly_events_evaluated_total").increment(1);
    }

    /// Record a detected anomaly, labeled by its type and severity.
    pub fn record_anomaly(anomaly_type: &str, severity: &str) {
        counter!(
            "anomalies_total",
            "type" => anomaly_type.to_string(),
            "severity" => severity.to_string()
        )
        .increment(1);
    }

    /// Record a committed offset.
    pub fn record_offset_committed() {
        counter!("anomaly_offsets_committed_total").increment(1);
    }

    /// Record the wall-clock time taken to process one batch.
    pub fn record_batch_duration(duration: Duration) {
        histogram!("anomaly_batch_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Kafka producer metrics recorder, shared by every binary that publishes.
pub struct ProducerMetrics;

impl ProducerMetrics {
    /// Record a broker-acknowledged publish.
    pub fn record_success() {
        counter!("kafka_produce_success_total").increment(1);
    }

    /// Record a publish failure.
    pub fn record_error() {
        counter!("kafka_produce_errors_total").increment(1);
    }
}

/// Retry metrics recorder, used by [`crate::retry`].
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt (a failure that will be retried).
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record an operation that succeeded after retrying.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// Record an operation that exhausted all retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_starts_without_a_handle_before_start_is_called() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
    }

    #[test]
    fn starting_the_server_is_idempotent_across_instances() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        assert!(server.start().is_ok());

        let mut second = MetricsServer::new(addr);
        assert!(second.start().is_ok());
    }

    #[test]
    fn recording_metrics_does_not_panic_without_a_recorder() {
        IngestMetrics::record_polled(10);
        IngestMetrics::record_row_inserted();
        IngestMetrics::record_invalid_routed();
        IngestMetrics::record_dlq_routed();
        IngestMetrics::record_offset_committed();
        IngestMetrics::record_batch_duration(Duration::from_millis(5));
        AnomalyMetrics::record_evaluated();
        AnomalyMetrics::record_anomaly("SPIKE", "high");
        ProducerMetrics::record_success();
        RetryMetrics::record_attempt();
    }
}
