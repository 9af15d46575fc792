//! Recording test doubles for the ports
//!
//! Every mock writes one line per call into a shared [`CallLog`], so tests can
//! assert on the exact order of remote operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{Environment, EnvironmentEntry, ProjectConfig, RunContext};
use crate::domain::ports::{
    CommandOutput, DeployEvent, DeployEventSink, FileTransfer, RemoteShell, SyncSpec,
    VersionControl,
};
use crate::domain::value_objects::{HostTarget, RemoteCommand, Revision};
use crate::error::{HoistError, HoistResult};

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first entry containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.contains(needle))
    }
}

pub struct MockShell {
    log: CallLog,
    fail_on: Option<(String, i32)>,
}

impl MockShell {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail_on: None }
    }

    /// Fail every command whose line contains `needle`
    pub fn failing_on(mut self, needle: &str, code: i32) -> Self {
        self.fail_on = Some((needle.to_string(), code));
        self
    }
}

impl RemoteShell for MockShell {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        self.log.push(format!("run {}: {}", host, command.line()));
        match &self.fail_on {
            Some((needle, code)) if command.line().contains(needle.as_str()) => {
                Err(HoistError::CommandFailed {
                    host: host.to_string(),
                    command: command.line().to_string(),
                    code: Some(*code),
                    stderr: String::new(),
                })
            }
            _ => Ok(CommandOutput::default()),
        }
    }

    fn release(&self, host: &HostTarget) {
        self.log.push(format!("release {}", host));
    }
}

pub struct MockTransfer {
    log: CallLog,
    fail: bool,
}

impl MockTransfer {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl FileTransfer for MockTransfer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()> {
        let local = local_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.log.push(format!(
            "push {}: {} -> {} (delete={}, chmod={}, excludes={})",
            host,
            local,
            remote_dir,
            spec.delete,
            spec.chmod.as_deref().unwrap_or("-"),
            spec.excludes.join(" ")
        ));
        if self.fail {
            return Err(HoistError::TransferFailed {
                host: host.to_string(),
                remote_dir: remote_dir.to_string(),
                code: Some(23),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

pub struct MockVcs {
    log: CallLog,
    revision: Revision,
    files: Vec<(PathBuf, String)>,
}

impl MockVcs {
    pub fn new(log: CallLog, revision: Revision) -> Self {
        Self {
            log,
            revision,
            files: vec![(PathBuf::from("manage.py"), "#!/usr/bin/env python\n".to_string())],
        }
    }
}

impl VersionControl for MockVcs {
    fn resolve(&self, reference: &str) -> HoistResult<Revision> {
        self.log.push(format!("resolve {}", reference));
        if reference == "missing" {
            return Err(HoistError::UnresolvedReference {
                reference: reference.to_string(),
                message: "revspec not found".to_string(),
            });
        }
        Ok(self.revision.clone())
    }

    fn export_subtree(&self, commit: &str, subtree: &Path, dest: &Path) -> HoistResult<usize> {
        self.log
            .push(format!("export {} {}", commit, subtree.display()));
        for (path, content) in &self.files {
            let target = dest.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, content)?;
        }
        Ok(self.files.len())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DeployEventSink for RecordingSink {
    fn on_event(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A complete environment named `production` on the given hosts
pub fn environment(hosts: &[&str]) -> Environment {
    Environment::from_entry(
        "production",
        EnvironmentEntry {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            key_filename: None,
            user: Some("luke".to_string()),
            group: Some("www-data".to_string()),
            site_dir: Some("/srv/luke/site".to_string()),
            maintenance_dir: Some("/srv/luke/maintenance".to_string()),
            django_settings: Some("luke.settings.production".to_string()),
        },
    )
    .unwrap()
}

/// Run context whose snapshots land under `snapshot_root`
pub fn context(hosts: &[&str], snapshot_root: &Path) -> RunContext {
    let mut project = ProjectConfig::default();
    project.project.name = Some("luke".to_string());
    project.deploy.snapshot_root = Some(snapshot_root.to_path_buf());
    RunContext::new(environment(hosts), project, "luke")
}
