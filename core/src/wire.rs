//! UTF-8 JSON wire format shared by every topic in the pipeline.
//!
//! Every record on every topic is a UTF-8 encoded JSON object. Decoding a
//! [`crate::event::HeartbeatEvent`] is a two-step process — first parse the
//! text as JSON, then run the domain constructor's invariants — so that a
//! syntactically valid but semantically invalid record (e.g.
//! `heart_rate: -5`) is distinguished from garbled text only by which
//! [`WireError`] variant comes back; callers that just need "is this
//! VALIDATION-classified" can match on either.

use serde::Serialize;

use crate::anomaly::AnomalyEvent;
use crate::event::{EventError, HeartbeatEvent, HeartbeatEventWire};
use crate::invalid::InvalidEvent;

/// Failure decoding or encoding a wire record.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The text was not valid JSON, or was valid JSON of the wrong shape
    /// (missing a required key).
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON parsed but violated a domain invariant.
    #[error("invalid event: {0}")]
    Invalid(#[from] EventError),
}

/// Decode a [`HeartbeatEvent`] from its wire form.
///
/// # Errors
///
/// Returns [`WireError::Json`] if the text is not a JSON object with the
/// required keys, or [`WireError::Invalid`] if it parses but violates a
/// domain invariant (empty `customer_id`, out-of-range `heart_rate`).
pub fn decode_heartbeat(raw: &str) -> Result<HeartbeatEvent, WireError> {
    let wire: HeartbeatEventWire = serde_json::from_str(raw)?;
    Ok(HeartbeatEvent::try_from(wire)?)
}

/// Encode a [`HeartbeatEvent`] to its wire form.
///
/// # Errors
///
/// Returns [`WireError::Json`] if serialization fails, which does not
/// happen for well-formed domain values but is surfaced rather than
/// panicked on.
pub fn encode_heartbeat(event: &HeartbeatEvent) -> Result<String, WireError> {
    let wire = HeartbeatEventWire::from(event);
    Ok(serde_json::to_string(&wire)?)
}

/// Encode an [`AnomalyEvent`] to its wire form.
///
/// # Errors
///
/// Returns [`WireError::Json`] if serialization fails.
pub fn encode_anomaly(anomaly: &AnomalyEvent) -> Result<String, WireError> {
    Ok(serde_json::to_string(anomaly)?)
}

/// Decode an [`AnomalyEvent`] from its wire form (used by tests and any
/// downstream consumer of the anomaly topic).
///
/// # Errors
///
/// Returns [`WireError::Json`] if the text is not a well-formed anomaly
/// record.
pub fn decode_anomaly(raw: &str) -> Result<AnomalyEvent, WireError> {
    Ok(serde_json::from_str(raw)?)
}

/// Encode an [`InvalidEvent`] to its wire form.
///
/// # Errors
///
/// Returns [`WireError::Json`] if serialization fails.
pub fn encode_invalid(invalid: &InvalidEvent) -> Result<String, WireError> {
    Ok(serde_json::to_string(invalid)?)
}

/// Encode any serializable value, for the occasional ad hoc payload.
///
/// # Errors
///
/// Returns [`WireError::Json`] if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<String, WireError> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyThresholds, evaluate};

    #[test]
    fn heartbeat_round_trips_identity_on_value_fields() {
        let original = HeartbeatEvent::new("cust_00001", 88).expect("valid");
        let encoded = encode_heartbeat(&original).expect("encode");
        let decoded = decode_heartbeat(&encoded).expect("decode");
        assert_eq!(decoded.event_id(), original.event_id());
        assert_eq!(decoded.customer_id(), original.customer_id());
        assert_eq!(decoded.heart_rate(), original.heart_rate());
        assert_eq!(decoded.timestamp(), original.timestamp());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let original = HeartbeatEvent::new("cust_00001", 88).expect("valid");
        let wire = HeartbeatEventWire::from(&original);
        let mut value = serde_json::to_value(&wire).expect("value");
        value
            .as_object_mut()
            .expect("object")
            .insert("extra_field".to_string(), serde_json::json!("ignored"));
        let raw = serde_json::to_string(&value).expect("string");
        let decoded = decode_heartbeat(&raw).expect("decode");
        assert_eq!(decoded.customer_id(), "cust_00001");
    }

    #[test]
    fn missing_required_key_fails_to_decode() {
        let raw = r#"{"customer_id":"cust_00001","heart_rate":72}"#;
        let err = decode_heartbeat(raw).unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
    }

    #[test]
    fn domain_invariant_violation_is_distinguished_from_malformed_json() {
        let raw = format!(
            r#"{{"event_id":"{}","customer_id":"","timestamp":"2024-01-01T00:00:00Z","heart_rate":72}}"#,
            uuid::Uuid::new_v4()
        );
        let err = decode_heartbeat(&raw).unwrap_err();
        assert!(matches!(err, WireError::Invalid(EventError::EmptyCustomerId)));
    }

    #[test]
    fn anomaly_round_trips() {
        let event = HeartbeatEvent::new("cust_00001", 50).expect("valid");
        let anomaly = evaluate(&event, &[], &AnomalyThresholds::default()).expect("anomaly");
        let encoded = encode_anomaly(&anomaly).expect("encode");
        let decoded = decode_anomaly(&encoded).expect("decode");
        assert_eq!(decoded, anomaly);
    }

    #[test]
    fn invalid_event_encodes_with_error_type() {
        let invalid = InvalidEvent::validation("bad json", "{not json");
        let encoded = encode_invalid(&invalid).expect("encode");
        assert!(encoded.contains("\"error_type\":\"VALIDATION\""));
    }
}
