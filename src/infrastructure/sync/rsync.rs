//! Rsync Transfer
//!
//! Mirrors a local directory into a remote one with rsync over ssh. Transfers
//! are checksum-based, so re-running an upload only sends what changed.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::domain::ports::{FileTransfer, RemoteShell, SyncSpec};
use crate::domain::value_objects::HostTarget;
use crate::error::{HoistError, HoistResult};
use crate::infrastructure::shell::SshShell;

/// Checksum, recursive, keep times, compress, verbose with progress
pub const RSYNC_DEFAULT_OPTS: &str = "-chrtvzP";

/// Transfer strategy using rsync
///
/// Shares connection settings (port, key, control socket) with the ssh shell.
pub struct RsyncTransfer {
    ssh: Arc<SshShell>,
}

impl RsyncTransfer {
    pub fn new(ssh: Arc<SshShell>) -> Self {
        Self { ssh }
    }

    /// Check if rsync is installed and available
    pub fn check_available() -> bool {
        Command::new("rsync")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Argument vector for one push
    pub fn build_args(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> Vec<String> {
        let mut args = vec![RSYNC_DEFAULT_OPTS.to_string()];
        if spec.delete {
            args.push("--delete".to_string());
        }
        if let Some(mode) = &spec.chmod {
            args.push(format!("--chmod={}", mode));
        }
        for pattern in &spec.excludes {
            args.push(format!("--exclude={}", pattern));
        }
        args.push("-e".to_string());
        args.push(self.ssh.rsh_command(host));

        // trailing slash = copy contents
        let local = local_dir.display().to_string();
        if local.ends_with('/') {
            args.push(local);
        } else {
            args.push(format!("{}/", local));
        }
        args.push(format!("{}:{}", remote_host(&self.ssh.destination(host)), remote_dir));
        args
    }

    /// rsync process for one push; the host counts as contacted from here on
    fn command(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> Command {
        let args = self.build_args(host, local_dir, remote_dir, spec);
        tracing::debug!(host = %host, args = ?args, "rsync");
        self.ssh.mark_contacted(host);

        let mut cmd = Command::new("rsync");
        cmd.args(&args).stdin(Stdio::inherit()); // Allow password input

        if self.ssh.options().capture {
            cmd.stdout(Stdio::null()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd
    }
}

/// IPv6 literals need brackets in `host:path`
fn remote_host(destination: &str) -> String {
    let (user, host) = match destination.split_once('@') {
        Some((user, host)) => (Some(user), host),
        None => (None, destination),
    };
    let host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    match user {
        Some(user) => format!("{}@{}", user, host),
        None => host,
    }
}

impl FileTransfer for RsyncTransfer {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()> {
        let output = match self.command(host, local_dir, remote_dir, spec).output() {
            Ok(output) => output,
            Err(source) => {
                self.ssh.release(host);
                return Err(HoistError::SpawnFailed {
                    program: "rsync".to_string(),
                    source,
                });
            }
        };

        if !output.status.success() {
            self.ssh.release(host);
            return Err(HoistError::TransferFailed {
                host: host.to_string(),
                remote_dir: remote_dir.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }
}
