//! Builders for the domain types every pipeline stage's tests need, so
//! scenario setup reads as data rather than boilerplate construction.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use heartpulse_core::anomaly::{AnomalyEvent, AnomalyType, Severity};
use heartpulse_core::event::HeartbeatEvent;
use heartpulse_core::invalid::InvalidEvent;
use uuid::Uuid;

/// A fixed instant (2024-01-01T00:00:00Z) for tests that need a
/// deterministic timestamp rather than `Utc::now()`.
#[must_use]
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

/// A zero-padded subject id in the pipeline's `cust_NNNNN` convention.
#[must_use]
pub fn customer_id(n: u32) -> String {
    format!("cust_{n:05}")
}

/// A heartbeat at the fixed instant, for tests that don't care about wall
/// clock drift.
///
/// # Panics
///
/// Panics if `heart_rate` violates [`HeartbeatEvent`]'s invariants — call
/// sites are expected to pass valid fixture values.
#[must_use]
pub fn heartbeat(customer: &str, heart_rate: i32) -> HeartbeatEvent {
    HeartbeatEvent::try_new(Uuid::new_v4(), customer, fixed_instant(), heart_rate)
        .unwrap_or_else(|e| panic!("fixture heartbeat should be valid: {e}"))
}

/// A heartbeat with an explicit `event_id` and `timestamp`, for tests that
/// assert on provenance (e.g. idempotent-write round trips).
///
/// # Panics
///
/// Panics if `heart_rate` violates [`HeartbeatEvent`]'s invariants.
#[must_use]
pub fn heartbeat_with_id(
    event_id: Uuid,
    customer: &str,
    timestamp: DateTime<Utc>,
    heart_rate: i32,
) -> HeartbeatEvent {
    HeartbeatEvent::try_new(event_id, customer, timestamp, heart_rate)
        .unwrap_or_else(|e| panic!("fixture heartbeat should be valid: {e}"))
}

/// A LOW_HEART_RATE anomaly for `customer` at the fixed instant.
#[must_use]
pub fn low_anomaly(customer: &str, heart_rate: i32, threshold: i32) -> AnomalyEvent {
    AnomalyEvent {
        event_id: Uuid::new_v4(),
        customer_id: customer.to_string(),
        timestamp: fixed_instant(),
        heart_rate,
        anomaly_type: AnomalyType::LowHeartRate,
        severity: Severity::High,
        details: BTreeMap::from([
            ("threshold".to_string(), threshold.into()),
            ("measured".to_string(), heart_rate.into()),
        ]),
    }
}

/// A SPIKE anomaly for `customer` at the fixed instant.
#[must_use]
pub fn spike_anomaly(customer: &str, heart_rate: i32, previous: i32, delta: i32) -> AnomalyEvent {
    AnomalyEvent {
        event_id: Uuid::new_v4(),
        customer_id: customer.to_string(),
        timestamp: fixed_instant(),
        heart_rate,
        anomaly_type: AnomalyType::Spike,
        severity: Severity::Medium,
        details: BTreeMap::from([
            ("delta".to_string(), delta.into()),
            ("previous".to_string(), previous.into()),
            ("measured".to_string(), heart_rate.into()),
        ]),
    }
}

/// A malformed-JSON invalid event, as the ingest consumer would produce for
/// undecodable text.
#[must_use]
pub fn malformed_invalid(raw: &str) -> InvalidEvent {
    InvalidEvent::validation("malformed JSON", raw)
}
