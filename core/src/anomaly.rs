//! `AnomalyEvent` and the pure, stateless anomaly rule engine.
//!
//! The rule engine is deliberately free of I/O: [`evaluate`] is a pure
//! function of a reading and a short history of recent rates for the same
//! subject. This is what makes the rule set testable without a broker or a
//! database — every scenario in the rule table can be pinned as a plain
//! unit test.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::event::HeartbeatEvent;

/// The kind of anomaly a rule detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    /// Heart rate at or below the low threshold.
    #[serde(rename = "LOW_HEART_RATE")]
    LowHeartRate,
    /// Heart rate at or above the high threshold.
    #[serde(rename = "HIGH_HEART_RATE")]
    HighHeartRate,
    /// Absolute delta from the previous reading at or above the spike delta.
    #[serde(rename = "SPIKE")]
    Spike,
}

/// How severe an anomaly is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// LOW_HEART_RATE and HIGH_HEART_RATE are always high severity.
    High,
    /// SPIKE is always medium severity.
    Medium,
}

impl AnomalyType {
    /// The wire/storage name of this variant (`LOW_HEART_RATE`, etc.).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowHeartRate => "LOW_HEART_RATE",
            Self::HighHeartRate => "HIGH_HEART_RATE",
            Self::Spike => "SPIKE",
        }
    }
}

impl Severity {
    /// The wire/storage name of this variant (`high`, `medium`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

/// A reading flagged by the anomaly rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    /// The identifier of the originating `HeartbeatEvent`.
    pub event_id: Uuid,
    /// The subject the reading belongs to.
    pub customer_id: String,
    /// The instant the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// The reading that triggered the rule.
    pub heart_rate: i32,
    /// Which rule fired.
    pub anomaly_type: AnomalyType,
    /// The rule's fixed severity.
    pub severity: Severity,
    /// Rule-specific context (`threshold`, `measured`, `previous`, `delta`).
    pub details: BTreeMap<String, Value>,
}

/// Threshold configuration the rule engine is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyThresholds {
    /// Rule 1 fires at or below this rate.
    pub low: i32,
    /// Rule 2 fires at or above this rate.
    pub high: i32,
    /// Rule 3 fires when the absolute delta from the last reading is at
    /// least this large.
    pub spike_delta: i32,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            low: 50,
            high: 140,
            spike_delta: 30,
        }
    }
}

/// Apply the priority-ordered rule set to a single reading.
///
/// Evaluation order is LOW → HIGH → SPIKE; the first matching rule wins.
/// `recent_rates` is the subject's history ordered oldest-to-newest; only
/// the last element is consulted. An empty history means the SPIKE rule
/// cannot fire (there is nothing to compare against), but LOW and HIGH
/// still apply.
#[must_use]
pub fn evaluate(
    event: &HeartbeatEvent,
    recent_rates: &[i32],
    thresholds: &AnomalyThresholds,
) -> Option<AnomalyEvent> {
    let rate = event.heart_rate();

    if rate <= thresholds.low {
        return Some(build(event, AnomalyType::LowHeartRate, Severity::High, [
            ("threshold".to_string(), Value::from(thresholds.low)),
            ("measured".to_string(), Value::from(rate)),
        ]));
    }

    if rate >= thresholds.high {
        return Some(build(event, AnomalyType::HighHeartRate, Severity::High, [
            ("threshold".to_string(), Value::from(thresholds.high)),
            ("measured".to_string(), Value::from(rate)),
        ]));
    }

    if let Some(&previous) = recent_rates.last() {
        let delta = (rate - previous).abs();
        if delta >= thresholds.spike_delta {
            return Some(build(event, AnomalyType::Spike, Severity::Medium, [
                ("delta".to_string(), Value::from(delta)),
                ("threshold".to_string(), Value::from(thresholds.spike_delta)),
                ("previous".to_string(), Value::from(previous)),
                ("measured".to_string(), Value::from(rate)),
            ]));
        }
    }

    None
}

fn build(
    event: &HeartbeatEvent,
    anomaly_type: AnomalyType,
    severity: Severity,
    details: impl IntoIterator<Item = (String, Value)>,
) -> AnomalyEvent {
    AnomalyEvent {
        event_id: event.event_id(),
        customer_id: event.customer_id().to_string(),
        timestamp: event.timestamp(),
        heart_rate: event.heart_rate(),
        anomaly_type,
        severity,
        details: details.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(rate: i32) -> HeartbeatEvent {
        HeartbeatEvent::new("cust_00001", rate).expect("valid")
    }

    fn thresholds() -> AnomalyThresholds {
        AnomalyThresholds::default()
    }

    // Scenario A: single reading, no history yet — nothing should fire.
    #[test]
    fn scenario_a_single_normal_reading() {
        let anomaly = evaluate(&event(72), &[], &thresholds());
        assert!(anomaly.is_none());
    }

    // Scenario B: 72 then 110 — delta 38 >= 30 fires SPIKE.
    #[test]
    fn scenario_b_spike_after_normal_reading() {
        let anomaly = evaluate(&event(110), &[72], &thresholds()).expect("spike");
        assert_eq!(anomaly.anomaly_type, AnomalyType::Spike);
        assert_eq!(anomaly.details["previous"], Value::from(72));
        assert_eq!(anomaly.details["delta"], Value::from(38));
    }

    // Scenario C: first event at exactly the low threshold.
    #[test]
    fn scenario_c_low_threshold_on_first_event() {
        let anomaly = evaluate(&event(50), &[], &thresholds()).expect("low");
        assert_eq!(anomaly.anomaly_type, AnomalyType::LowHeartRate);
        assert_eq!(anomaly.severity, Severity::High);
        assert_eq!(anomaly.details["threshold"], Value::from(50));
        assert_eq!(anomaly.details["measured"], Value::from(50));
    }

    // Scenario D: 90 then 50 — LOW wins over SPIKE despite a 40bpm delta.
    #[test]
    fn scenario_d_low_priority_over_spike() {
        let anomaly = evaluate(&event(50), &[90], &thresholds()).expect("low");
        assert_eq!(anomaly.anomaly_type, AnomalyType::LowHeartRate);
    }

    // Scenario E: high threshold.
    #[test]
    fn scenario_e_high_threshold() {
        let anomaly = evaluate(&event(140), &[], &thresholds()).expect("high");
        assert_eq!(anomaly.anomaly_type, AnomalyType::HighHeartRate);
        assert_eq!(anomaly.severity, Severity::High);
        assert_eq!(anomaly.details["threshold"], Value::from(140));
        assert_eq!(anomaly.details["measured"], Value::from(140));
    }

    // Scenario F: only the most recent history entry matters.
    #[test]
    fn scenario_f_spike_uses_last_history_entry_only() {
        let anomaly = evaluate(&event(100), &[80, 75, 60], &thresholds()).expect("spike");
        assert_eq!(anomaly.anomaly_type, AnomalyType::Spike);
        assert_eq!(anomaly.details["previous"], Value::from(60));
        assert_eq!(anomaly.details["delta"], Value::from(40));
    }

    // Scenario G: delta one below the spike threshold never fires.
    #[test]
    fn scenario_g_delta_below_threshold_does_not_fire() {
        let anomaly = evaluate(&event(94), &[65], &thresholds());
        assert!(anomaly.is_none());
    }

    #[test]
    fn spike_fires_on_downward_jump_too() {
        let anomaly = evaluate(&event(65), &[100], &thresholds()).expect("spike");
        assert_eq!(anomaly.anomaly_type, AnomalyType::Spike);
    }

    #[test]
    fn empty_history_cannot_trigger_spike() {
        let anomaly = evaluate(&event(90), &[], &thresholds());
        assert!(anomaly.is_none());
    }

    #[test]
    fn at_most_one_anomaly_is_ever_emitted() {
        // A reading that could plausibly match more than one rule
        // description still yields exactly one AnomalyEvent.
        let anomaly = evaluate(&event(140), &[40], &thresholds());
        assert_eq!(
            anomaly.map(|a| a.anomaly_type),
            Some(AnomalyType::HighHeartRate)
        );
    }
}
