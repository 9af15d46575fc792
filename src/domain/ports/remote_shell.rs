//! Remote Shell Port
//!
//! Executes one shell line on one host and blocks until it exits.

use crate::domain::value_objects::{HostTarget, RemoteCommand};
use crate::error::HoistResult;

/// Captured output of a finished command
///
/// Implementations that stream output straight to the terminal leave these empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Trait for remote command execution
///
/// Implementations:
/// - `SshShell` - runs commands through the `ssh` client
/// - `DryRunShell` - prints commands without running them
pub trait RemoteShell {
    /// Run `command` on `host`.
    ///
    /// A non-zero exit status is an error (`HoistError::CommandFailed`).
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput>;

    /// Drop any connection state kept for `host`
    fn release(&self, _host: &HostTarget) {}
}

impl<T: RemoteShell + ?Sized> RemoteShell for &T {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        (**self).run(host, command)
    }

    fn release(&self, host: &HostTarget) {
        (**self).release(host)
    }
}

impl<T: RemoteShell + ?Sized> RemoteShell for Box<T> {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        (**self).run(host, command)
    }

    fn release(&self, host: &HostTarget) {
        (**self).release(host)
    }
}

impl<T: RemoteShell + ?Sized> RemoteShell for std::sync::Arc<T> {
    fn run(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<CommandOutput> {
        (**self).run(host, command)
    }

    fn release(&self, host: &HostTarget) {
        (**self).release(host)
    }
}
