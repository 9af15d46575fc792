//! JSON Event Sink
//!
//! Outputs deploy and task events as NDJSON for CI/automation consumption.

use crate::domain::ports::{DeployEvent, DeployEventSink};
use chrono::{SecondsFormat, Utc};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, mut event: serde_json::Value) {
        if let Some(map) = event.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

/// JSON body of one event, without the timestamp
pub fn event_to_json(event: &DeployEvent) -> serde_json::Value {
    match event {
        DeployEvent::Started { git_ref, hosts } => serde_json::json!({
            "event": "start",
            "command": "deploy",
            "git_ref": git_ref,
            "hosts": hosts,
        }),

        DeployEvent::Resolved {
            commit,
            branch,
            snapshot,
        } => serde_json::json!({
            "event": "resolved",
            "command": "deploy",
            "commit": commit,
            "branch": branch,
            "snapshot": snapshot.display().to_string(),
        }),

        DeployEvent::PhaseStarted { phase, host } => serde_json::json!({
            "event": "phase_start",
            "command": "deploy",
            "phase": phase.name(),
            "host": host,
        }),

        DeployEvent::PhaseCompleted { phase, host } => serde_json::json!({
            "event": "phase_complete",
            "command": "deploy",
            "phase": phase.name(),
            "host": host,
        }),

        DeployEvent::StepStarted { host, step } => serde_json::json!({
            "event": "step_start",
            "command": "deploy",
            "host": host,
            "step": step.name(),
        }),

        DeployEvent::StepCompleted { host, step } => serde_json::json!({
            "event": "step_complete",
            "command": "deploy",
            "host": host,
            "step": step.name(),
        }),

        DeployEvent::StepSkipped { host, step, reason } => serde_json::json!({
            "event": "step_skipped",
            "command": "deploy",
            "host": host,
            "step": step.name(),
            "reason": reason,
        }),

        DeployEvent::TaskStarted { task, host } => serde_json::json!({
            "event": "task_start",
            "command": task,
            "host": host,
        }),

        DeployEvent::TaskCompleted { task, host } => serde_json::json!({
            "event": "task_complete",
            "command": task,
            "host": host,
        }),

        DeployEvent::Completed {
            git_ref,
            commit,
            hosts,
        } => serde_json::json!({
            "event": "complete",
            "command": "deploy",
            "status": "success",
            "git_ref": git_ref,
            "commit": commit,
            "hosts": hosts,
        }),
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        self.write_event(event_to_json(&event));
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
