//! Deploy Event Port
//!
//! Provides an observable interface for task and deploy operations.
//! Enables progress reporting, JSON event streams, and debugging.

use std::path::PathBuf;

use crate::domain::value_objects::{DeployPhase, ProvisionStep};

/// Event emitted while tasks run
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Deploy started
    Started { git_ref: String, hosts: Vec<String> },

    /// Git reference resolved and snapshot location decided
    Resolved {
        commit: String,
        branch: String,
        snapshot: PathBuf,
    },

    /// Phase started (`host` is `None` for local phases)
    PhaseStarted {
        phase: DeployPhase,
        host: Option<String>,
    },

    /// Phase finished successfully
    PhaseCompleted {
        phase: DeployPhase,
        host: Option<String>,
    },

    /// Provisioning step started
    StepStarted { host: String, step: ProvisionStep },

    /// Provisioning step finished successfully
    StepCompleted { host: String, step: ProvisionStep },

    /// Provisioning step not applicable to this project
    StepSkipped {
        host: String,
        step: ProvisionStep,
        reason: String,
    },

    /// Stand-alone task started on a host
    TaskStarted { task: String, host: String },

    /// Stand-alone task finished on a host
    TaskCompleted { task: String, host: String },

    /// Deploy completed on every host
    Completed {
        git_ref: String,
        commit: String,
        hosts: Vec<String>,
    },
}

/// Trait for receiving deploy events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait DeployEventSink: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants per-step events
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {
        // Do nothing
    }

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
