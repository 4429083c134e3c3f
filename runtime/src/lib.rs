//! # Heartpulse Runtime
//!
//! Ambient plumbing shared by every heartpulse binary: retry with
//! exponential backoff, Prometheus metrics, and cooperative shutdown.
//!
//! ## Modules
//!
//! - [`retry`]: exponential backoff retry for transient Kafka/Postgres
//!   failures.
//! - [`metrics`]: the Prometheus exporter and the counters/histograms each
//!   consumer records.
//! - [`shutdown`]: the `SIGTERM`/`Ctrl+C`-driven cooperative shutdown flag.

pub mod metrics;
pub mod retry;
pub mod shutdown;

pub use retry::{RetryPolicy, retry_with_backoff, retry_with_predicate};
pub use shutdown::ShutdownFlag;
