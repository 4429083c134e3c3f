//! The `HeartbeatEvent` domain type and its validation invariants.
//!
//! A `HeartbeatEvent` is one physiological reading for one subject. It is
//! constructed through [`HeartbeatEvent::new`] or [`HeartbeatEvent::try_new`],
//! both of which enforce the hard invariants documented on the type. Once
//! constructed, a `HeartbeatEvent` is immutable and safely `Send + Sync`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when constructing a [`HeartbeatEvent`] from untrusted
/// fields fails one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// `customer_id` was empty after trimming whitespace.
    #[error("customer_id cannot be empty")]
    EmptyCustomerId,

    /// `heart_rate` fell outside the hard bounds `0..=250`.
    #[error("heart_rate {0} out of hard bounds 0..=250")]
    HeartRateOutOfBounds(i32),
}

/// One heart-rate reading for one subject.
///
/// # Invariants
///
/// - `heart_rate` is always in `0..=250` (enforced at construction).
/// - `customer_id` is never empty after trimming.
///
/// These are the type's *hard* bounds. Deployment-configurable *soft*
/// bounds (narrower, e.g. `[45, 185]`) are enforced separately at ingest
/// time by the consumer, not here — a reading outside soft bounds must
/// still be constructible so it can be quarantined rather than dropped
/// silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatEvent {
    event_id: Uuid,
    customer_id: String,
    timestamp: DateTime<Utc>,
    heart_rate: i32,
}

impl HeartbeatEvent {
    /// Construct a new event at the source, generating a fresh `event_id`
    /// and stamping the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if `customer_id` is empty after trimming or
    /// `heart_rate` is outside `0..=250`.
    pub fn new(customer_id: impl Into<String>, heart_rate: i32) -> Result<Self, EventError> {
        Self::try_new(Uuid::new_v4(), customer_id, Utc::now(), heart_rate)
    }

    /// Construct an event from fully specified fields, as when deserializing
    /// from the wire.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if `customer_id` is empty after trimming or
    /// `heart_rate` is outside `0..=250`.
    pub fn try_new(
        event_id: Uuid,
        customer_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        heart_rate: i32,
    ) -> Result<Self, EventError> {
        let customer_id = customer_id.into();
        let trimmed = customer_id.trim();
        if trimmed.is_empty() {
            return Err(EventError::EmptyCustomerId);
        }
        if !(0..=250).contains(&heart_rate) {
            return Err(EventError::HeartRateOutOfBounds(heart_rate));
        }
        Ok(Self {
            event_id,
            customer_id: trimmed.to_string(),
            timestamp,
            heart_rate,
        })
    }

    /// The event's unique identifier.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// The subject this reading belongs to.
    #[must_use]
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// The instant the reading was taken.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The reading itself, in beats per minute.
    #[must_use]
    pub const fn heart_rate(&self) -> i32 {
        self.heart_rate
    }

    /// Returns `true` if the reading falls within `[min, max]` (the
    /// deployment-configurable soft domain bounds).
    #[must_use]
    pub const fn within_soft_bounds(&self, min: i32, max: i32) -> bool {
        self.heart_rate >= min && self.heart_rate <= max
    }
}

/// Wire representation of a [`HeartbeatEvent`].
///
/// Carries the same four fields named in the external interface contract:
/// `event_id`, `customer_id`, `timestamp`, `heart_rate`. Unknown keys on
/// the input side are ignored by `serde_json`'s default behavior; missing
/// required keys fail deserialization before invariants are even checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HeartbeatEventWire {
    pub event_id: Uuid,
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub heart_rate: i32,
}

impl From<&HeartbeatEvent> for HeartbeatEventWire {
    fn from(event: &HeartbeatEvent) -> Self {
        Self {
            event_id: event.event_id,
            customer_id: event.customer_id.clone(),
            timestamp: event.timestamp,
            heart_rate: event.heart_rate,
        }
    }
}

impl TryFrom<HeartbeatEventWire> for HeartbeatEvent {
    type Error = EventError;

    fn try_from(wire: HeartbeatEventWire) -> Result<Self, Self::Error> {
        Self::try_new(wire.event_id, wire.customer_id, wire.timestamp, wire.heart_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_customer_id() {
        let err = HeartbeatEvent::new("   ", 72).unwrap_err();
        assert_eq!(err, EventError::EmptyCustomerId);
    }

    #[test]
    fn trims_customer_id() {
        let event = HeartbeatEvent::new("  cust_00001  ", 72).expect("valid");
        assert_eq!(event.customer_id(), "cust_00001");
    }

    #[test]
    fn rejects_heart_rate_above_hard_bound() {
        let err = HeartbeatEvent::new("cust_00001", 251).unwrap_err();
        assert_eq!(err, EventError::HeartRateOutOfBounds(251));
    }

    #[test]
    fn rejects_negative_heart_rate() {
        let err = HeartbeatEvent::new("cust_00001", -5).unwrap_err();
        assert_eq!(err, EventError::HeartRateOutOfBounds(-5));
    }

    #[test]
    fn accepts_hard_boundary_values() {
        assert!(HeartbeatEvent::new("cust_00001", 0).is_ok());
        assert!(HeartbeatEvent::new("cust_00001", 250).is_ok());
    }

    #[test]
    fn soft_bounds_do_not_block_construction() {
        // 260 is outside the default soft domain bounds [45, 185] but
        // inside the hard bounds 0..=250 — must still construct.
        let event = HeartbeatEvent::new("cust_00001", 200).expect("valid");
        assert!(!event.within_soft_bounds(45, 185));
    }
}
