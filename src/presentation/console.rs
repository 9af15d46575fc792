//! Console Event Sink
//!
//! Human-readable progress lines, interleaved with the remote output that ssh
//! and rsync stream to the same terminal.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::ports::{DeployEvent, DeployEventSink};

use super::theme::{Icon, Palette};

pub struct ConsoleEventSink {
    palette: Palette,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleEventSink {
    pub fn stdout(palette: Palette) -> Self {
        Self::with_writer(palette, io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(palette: Palette, writer: W) -> Self {
        Self {
            palette,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn render(&self, event: &DeployEvent) -> Option<String> {
        let p = &self.palette;
        let line = match event {
            DeployEvent::Started { git_ref, hosts } => format!(
                "{} {}",
                p.icon(Icon::Deploy),
                p.bold(&format!("Deploying {} to {}", git_ref, hosts.join(", ")))
            ),
            DeployEvent::Resolved {
                commit,
                branch,
                snapshot,
            } => format!(
                "  {}",
                p.dim(&format!(
                    "commit {} on {} -> {}",
                    commit,
                    branch,
                    snapshot.display()
                ))
            ),
            DeployEvent::PhaseStarted { phase, host } => format!(
                "{} {}{}",
                p.info(p.icon(Icon::Progress)),
                p.bold(phase.label()),
                host_suffix(p, host.as_deref())
            ),
            DeployEvent::PhaseCompleted { .. } => return None,
            DeployEvent::StepStarted { step, .. } => {
                format!("  {} {}", p.icon(Icon::Pending), step.label())
            }
            DeployEvent::StepCompleted { step, .. } => format!(
                "  {} {}",
                p.success(p.icon(Icon::Success)),
                step.label()
            ),
            DeployEvent::StepSkipped { step, reason, .. } => format!(
                "  {} {}",
                p.dim(p.icon(Icon::Skipped)),
                p.dim(&format!("{} (skipped: {})", step.label(), reason))
            ),
            DeployEvent::TaskStarted { task, host } => format!(
                "{} {}{}",
                p.info(p.icon(Icon::Progress)),
                p.bold(task),
                host_suffix(p, Some(host))
            ),
            DeployEvent::TaskCompleted { task, host } => format!(
                "{} {}{}",
                p.success(p.icon(Icon::Success)),
                task,
                host_suffix(p, Some(host))
            ),
            // the final summary is printed by the command itself
            DeployEvent::Completed { .. } => return None,
        };
        Some(line)
    }
}

fn host_suffix(palette: &Palette, host: Option<&str>) -> String {
    match host {
        Some(host) => format!(" {}", palette.dim(&format!("[{}]", host))),
        None => String::new(),
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        if let Some(line) = self.render(&event) {
            if let Ok(mut writer) = self.writer.lock() {
                let _ = writeln!(writer, "{}", line);
                let _ = writer.flush();
            }
        }
    }
}
