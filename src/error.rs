//! Error types for hoist
//!
//! Library code returns [`HoistError`]; the binary wraps it in `anyhow` at the edge.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hoist operations
pub type HoistResult<T> = Result<T, HoistError>;

/// Main error type for hoist operations
#[derive(Error, Debug)]
pub enum HoistError {
    /// Version reference could not be resolved to a commit
    #[error("cannot resolve git reference '{reference}': {message}")]
    UnresolvedReference { reference: String, message: String },

    /// Working directory is not inside a git repository
    #[error("not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// Source subtree does not exist at the resolved commit
    #[error("'{subtree}' does not exist at commit {commit}")]
    SubtreeMissing { subtree: PathBuf, commit: String },

    /// A task was dispatched before an environment was selected
    #[error("no environment selected - pass --env <name> or run 'environment:<name>' first")]
    EnvironmentNotSelected,

    /// Requested environment is not present in the environments file
    #[error("unknown environment '{name}' in {file}{suggestion}")]
    UnknownEnvironment {
        name: String,
        file: PathBuf,
        suggestion: String,
    },

    /// The selected environment lacks a key the task requires
    #[error("environment '{environment}' is missing required key '{key}'")]
    MissingEnvironmentKey { environment: String, key: String },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Task-style invocation could not be turned into a task
    #[error("invalid task '{task}': {message}")]
    InvalidTask { task: String, message: String },

    /// Maintenance toggle token was not boolean-like
    #[error("invalid toggle '{value}' - expected on/off, true/false, yes/no or 1/0")]
    InvalidToggle { value: String },

    /// External program could not be started
    #[error("failed to run {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Remote (or local) command exited unsuccessfully
    #[error("[{host}] command failed with {}: {command}{}", describe_code(.code), describe_stderr(.stderr))]
    CommandFailed {
        host: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// File synchronisation exited unsuccessfully
    #[error("[{host}] rsync to {remote_dir} failed with {}{}", describe_code(.code), describe_stderr(.stderr))]
    TransferFailed {
        host: String,
        remote_dir: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Operator declined a confirmation prompt
    #[error("aborted by user")]
    Aborted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git error outside reference resolution
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

impl HoistError {
    /// Process exit status for this error.
    ///
    /// Failed commands propagate their own exit status; malformed task
    /// invocations are usage errors (2); everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CommandFailed { code: Some(code), .. }
            | Self::TransferFailed { code: Some(code), .. } => (*code).clamp(1, 255) as u8,
            Self::InvalidTask { .. } | Self::InvalidToggle { .. } => 2,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}
