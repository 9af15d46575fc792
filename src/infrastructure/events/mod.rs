//! Event Sink Implementations
//!
//! Provides concrete implementations of DeployEventSink:
//! - JsonEventSink: NDJSON output for CI/automation
//!
//! The human-readable console sink lives in the presentation layer.

mod json;

pub use json::{event_to_json, JsonEventSink};
