//! SSH Remote Shell
//!
//! Runs each command through the system `ssh` client. With multiplexing enabled,
//! the first command to a host opens a control master that later commands
//! reuse; releasing the host closes it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::domain::ports::{CommandOutput, RemoteShell};
use crate::domain::value_objects::{quote, HostTarget, RemoteCommand};
use crate::error::{HoistError, HoistResult};

/// Connection settings shared by `ssh` and `rsync -e`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshOptions {
    /// Identity file; `~/` is expanded
    pub key_filename: Option<PathBuf>,
    /// Login used when a host entry has no `user@`
    pub default_user: Option<String>,
    /// Reuse one connection per host
    pub multiplex: bool,
    /// Capture output instead of streaming it (JSON mode)
    pub capture: bool,
}

impl SshOptions {
    pub fn with_key(mut self, key: Option<PathBuf>) -> Self {
        self.key_filename = key;
        self
    }

    pub fn with_default_user(mut self, user: Option<String>) -> Self {
        self.default_user = user;
        self
    }

    pub fn with_multiplex(mut self, multiplex: bool) -> Self {
        self.multiplex = multiplex;
        self
    }

    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }
}

/// Remote shell backed by the `ssh` binary
pub struct SshShell {
    options: SshOptions,
    control_dir: Option<TempDir>,
    masters: Mutex<HashSet<String>>,
}

impl SshShell {
    pub fn new(options: SshOptions) -> HoistResult<Self> {
        let control_dir = if options.multiplex {
            Some(tempfile::Builder::new().prefix("hoist-ssh-").tempdir()?)
        } else {
            None
        };
        Ok(Self {
            options,
            control_dir,
            masters: Mutex::new(HashSet::new()),
        })
    }

    pub fn options(&self) -> &SshOptions {
        &self.options
    }

    pub fn destination(&self, host: &HostTarget) -> String {
        host.destination(self.options.default_user.as_deref())
    }

    /// Options placed before the destination (`-p`, `-i`, control socket)
    pub fn connection_args(&self, host: &HostTarget) -> Vec<String> {
        connection_args(&self.options, self.control_path(), host)
    }

    /// `ssh ...` command string for `rsync -e`
    pub fn rsh_command(&self, host: &HostTarget) -> String {
        let mut parts = vec!["ssh".to_string()];
        parts.extend(self.connection_args(host).iter().map(|a| quote(a)));
        parts.join(" ")
    }

    /// Full argument vector for running `command` on `host`
    pub fn build_args(&self, host: &HostTarget, command: &RemoteCommand) -> Vec<String> {
        let mut args = self.connection_args(host);
        if command.wants_tty() {
            args.push("-t".to_string());
        }
        args.push(self.destination(host));
        args.push("--".to_string());
        args.push(command.line().to_string());
        args
    }

    /// Note that `host` was contacted, so a control master may be running
    pub(crate) fn mark_contacted(&self, host: &HostTarget) {
        if !self.options.multiplex {
            return;
        }
        if let Ok(mut masters) = self.masters.lock() {
            masters.insert(host.to_string());
        }
    }

    /// `-O exit` arguments for the master of `host`; `None` once closed
    pub(crate) fn take_master(&self, host: &HostTarget) -> Option<Vec<String>> {
        let opened = self
            .masters
            .lock()
            .map(|mut masters| masters.remove(&host.to_string()))
            .unwrap_or(false);
        if !opened {
            return None;
        }

        let mut args = self.connection_args(host);
        args.push("-O".to_string());
        args.push("exit".to_string());
        args.push(self.destination(host));
        Some(args)
    }

    fn control_path(&self) -> Option<PathBuf> {
        self.control_dir.as_ref().map(|d| d.path().join("%C"))
    }
}

fn connection_args(options: &SshOptions, control_path: Option<PathBuf>, host: &HostTarget) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(port) = host.port() {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    if let Some(key) = &options.key_filename {
        args.push("-i".to_string());
        args.push(expand_home(key).display().to_string());
    }
    if let Some(path) = control_path {
        args.push("-o".to_string());
        args.push("ControlMaster=auto".to_string());
        args.push("-o".to_string());
        args.push(format!("ControlPath={}", path.display()));
        args.push("-o".to_string());
        args.push("ControlPersist=yes".to_string());
    }
    args
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

impl RemoteShell for SshShell {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        let args = self.build_args(host, command);
        tracing::debug!(host = %host, command = %command, "ssh");

        let mut cmd = Command::new("ssh");
        cmd.args(&args).stdin(Stdio::inherit());
        if self.options.capture && !command.wants_tty() {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let output = cmd.output().map_err(|source| HoistError::SpawnFailed {
            program: "ssh".to_string(),
            source,
        })?;

        self.mark_contacted(host);

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(HoistError::CommandFailed {
                host: host.to_string(),
                command: command.line().to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    fn release(&self, host: &HostTarget) {
        let Some(args) = self.take_master(host) else {
            return;
        };

        let status = Command::new("ssh")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        tracing::debug!(host = %host, ok = status.map(|s| s.success()).unwrap_or(false), "ssh master closed");
    }
}
