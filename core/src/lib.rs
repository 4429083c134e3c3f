//! # Heartpulse Core
//!
//! Domain types, configuration, and wire format shared by every heartpulse
//! binary: the simulator/producer, the ingest consumer, and the anomaly
//! consumer.
//!
//! ## Modules
//!
//! - [`event`]: the `HeartbeatEvent` domain type and its invariants.
//! - [`anomaly`]: the `AnomalyEvent` type and the pure rule engine.
//! - [`invalid`]: the `InvalidEvent` quarantine envelope.
//! - [`history`]: the anomaly consumer's bounded per-subject rolling window.
//! - [`wire`]: JSON encode/decode for every topic's record shape.
//! - [`config`]: environment-driven, range-validated application config.

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod anomaly;
pub mod config;
pub mod event;
pub mod history;
pub mod invalid;
pub mod wire;
