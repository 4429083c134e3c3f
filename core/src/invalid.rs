//! `InvalidEvent` — the quarantine envelope for messages the ingest
//! consumer cannot process.

use serde::{Deserialize, Serialize};

/// Distinguishes why a message was quarantined, which in turn decides
/// which topic it is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorType {
    /// Schema or domain validation failure — deterministic per input.
    #[default]
    Validation,
    /// An unexpected fault while processing an otherwise valid message.
    Processing,
}

/// Envelope wrapping a message the primary pipeline could not process, so
/// downstream auditors can parse the failure out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidEvent {
    /// Human-readable cause.
    pub error: String,
    /// The original, undecoded message content.
    pub raw: String,
    /// Which quarantine lane this belongs in.
    pub error_type: ErrorType,
}

impl InvalidEvent {
    /// Build a validation-classified invalid event.
    #[must_use]
    pub fn validation(error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw: raw.into(),
            error_type: ErrorType::Validation,
        }
    }

    /// Build a processing-classified invalid event.
    #[must_use]
    pub fn processing(error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw: raw.into(),
            error_type: ErrorType::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_error_type_is_validation() {
        assert_eq!(ErrorType::default(), ErrorType::Validation);
    }

    #[test]
    fn validation_constructor_sets_error_type() {
        let invalid = InvalidEvent::validation("bad json", "{not json");
        assert_eq!(invalid.error_type, ErrorType::Validation);
    }

    #[test]
    fn processing_constructor_sets_error_type() {
        let invalid = InvalidEvent::processing("store unreachable", "{}");
        assert_eq!(invalid.error_type, ErrorType::Processing);
    }
}
