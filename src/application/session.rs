//! Scoped remote sessions
//!
//! A session binds a host, a working directory, exported variables and command
//! prefixes. Every command run through it is wrapped accordingly. Dropping the
//! session releases the host on the shell, on success and on `?` alike.

use crate::domain::ports::{CommandOutput, RemoteShell};
use crate::domain::value_objects::{quote, HostTarget, RemoteCommand};
use crate::error::HoistResult;

/// Extra prefixes and variables layered on top of a session for some commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOverlay {
    prefixes: Vec<String>,
    env: Vec<(String, String)>,
}

impl SessionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `prefix &&` before the command
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Export `key=value` for the command
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// A remote session bound to one host and one working directory
pub struct RemoteSession<'a> {
    shell: &'a dyn RemoteShell,
    host: &'a HostTarget,
    cwd: String,
    scope: SessionOverlay,
}

impl<'a> RemoteSession<'a> {
    /// Acquire a session; released when dropped
    pub fn open(shell: &'a dyn RemoteShell, host: &'a HostTarget, cwd: impl Into<String>) -> Self {
        let cwd = cwd.into();
        tracing::debug!(host = %host, cwd = %cwd, "session opened");
        Self {
            shell,
            host,
            cwd,
            scope: SessionOverlay::default(),
        }
    }

    /// Session without a working directory (commands run in the login dir)
    pub fn bare(shell: &'a dyn RemoteShell, host: &'a HostTarget) -> Self {
        Self::open(shell, host, "")
    }

    /// Export a variable for every command of this session
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope = std::mem::take(&mut self.scope).env(key, value);
        self
    }

    pub fn host(&self) -> &HostTarget {
        self.host
    }

    pub fn run(&self, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        self.run_with(&SessionOverlay::default(), command)
    }

    /// Run with additional prefixes/variables on top of the session's own
    pub fn run_with(
        &self,
        overlay: &SessionOverlay,
        command: &RemoteCommand,
    ) -> HoistResult<CommandOutput> {
        let wrapped = self.wrap(overlay, command);
        self.shell.run(self.host, &wrapped)
    }

    /// `cd <cwd> && export K=V && <prefix> && <command>`
    pub fn wrap(&self, overlay: &SessionOverlay, command: &RemoteCommand) -> RemoteCommand {
        let mut parts = Vec::new();
        if !self.cwd.is_empty() {
            parts.push(format!("cd {}", quote(&self.cwd)));
        }

        let exports: Vec<String> = self
            .scope
            .env
            .iter()
            .chain(overlay.env.iter())
            .map(|(k, v)| format!("{}={}", k, quote(v)))
            .collect();
        if !exports.is_empty() {
            parts.push(format!("export {}", exports.join(" ")));
        }

        parts.extend(self.scope.prefixes.iter().cloned());
        parts.extend(overlay.prefixes.iter().cloned());

        command.map_line(|line| {
            parts.push(line.to_string());
            parts.join(" && ")
        })
    }
}

impl Drop for RemoteSession<'_> {
    fn drop(&mut self) {
        self.shell.release(self.host);
        tracing::debug!(host = %self.host, cwd = %self.cwd, "session released");
    }
}
