//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all process spawning and repository I/O.
//!
//! ## Structure
//!
//! - `shell/` - `ssh` remote shell, vagrant key discovery
//! - `sync/` - rsync file transfer
//! - `vcs/` - git repository (libgit2)
//! - `events/` - NDJSON event sink
//! - `dry_run` - printing stand-ins for shell and transfer

pub mod dry_run;
pub mod events;
pub mod shell;
pub mod sync;
pub mod vcs;

// Re-export for convenience
pub use dry_run::{DryRunLog, DryRunShell, DryRunTransfer};
pub use events::JsonEventSink;
pub use shell::{SshOptions, SshShell};
pub use sync::RsyncTransfer;
pub use vcs::GitRepository;
