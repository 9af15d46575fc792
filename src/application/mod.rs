//! Application Layer
//!
//! Use cases that orchestrate the deployment flow.
//! This layer:
//! - Depends on Domain layer (value objects, ports)
//! - Coordinates remote sessions, transfers and the local repository
//! - Never spawns processes itself (that is Infrastructure)
//!
//! ## Use Cases
//!
//! - `DeployUseCase` - snapshot, maintenance, upload, provision, cleanup
//! - `TaskRunner` - dispatches every other task per host
//!
//! ## Building blocks
//!
//! - `RemoteSession` - scoped cwd/env/prefix activation, released on drop
//! - `SnapshotBuilder` - git subtree export into a local directory
//! - `MaintenanceToggle` - maintenance page on/off
//! - `Provisioner` - the post-upload pipeline

pub mod deploy;
pub mod maintenance;
pub mod provision;
pub mod session;
pub mod snapshot;
pub mod tasks;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use deploy::{DeployResult, DeployUseCase, HostReport};
pub use maintenance::MaintenanceToggle;
pub use provision::{normalize_remote_path, Provisioner};
pub use session::{RemoteSession, SessionOverlay};
pub use snapshot::{remove_snapshot, Snapshot, SnapshotBuilder};
pub use tasks::{parse_invocation, parse_task, Invocation, Task, TaskOutcome, TaskRunner};
pub use upload::{code_sync_spec, upload_snapshot};
