//! Dry-run ports
//!
//! Print what would run on each host instead of running it. The local snapshot
//! is still built and removed, so a dry run exercises the repository as well.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::domain::ports::{CommandOutput, FileTransfer, RemoteShell, SyncSpec};
use crate::domain::value_objects::{quote, HostTarget, RemoteCommand};
use crate::error::HoistResult;
use crate::infrastructure::sync::RsyncTransfer;

/// Shared line writer for the dry-run ports
#[derive(Clone)]
pub struct DryRunLog {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl DryRunLog {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    fn line(&self, host: &HostTarget, text: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "[{}] {}", host, text);
            let _ = writer.flush();
        }
    }
}

pub struct DryRunShell {
    log: DryRunLog,
}

impl DryRunShell {
    pub fn new(log: DryRunLog) -> Self {
        Self { log }
    }
}

impl RemoteShell for DryRunShell {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        tracing::debug!(host = %host, command = %command, "dry run");
        self.log.line(host, &format!("run: {}", command.line()));
        Ok(CommandOutput::default())
    }
}

pub struct DryRunTransfer {
    rsync: RsyncTransfer,
    log: DryRunLog,
}

impl DryRunTransfer {
    pub fn new(rsync: RsyncTransfer, log: DryRunLog) -> Self {
        Self { rsync, log }
    }
}

impl FileTransfer for DryRunTransfer {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()> {
        let args: Vec<String> = self
            .rsync
            .build_args(host, local_dir, remote_dir, spec)
            .iter()
            .map(|a| quote(a))
            .collect();
        self.log.line(host, &format!("rsync {}", args.join(" ")));
        Ok(())
    }
}
