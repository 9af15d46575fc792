//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod deploy_events;
pub mod file_transfer;
pub mod remote_shell;
pub mod version_control;

pub use deploy_events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use file_transfer::{FileTransfer, SyncSpec};
pub use remote_shell::{CommandOutput, RemoteShell};
pub use version_control::VersionControl;
