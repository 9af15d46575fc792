//! Hoist - remote deployment orchestrator
//!
//! Hoist snapshots a git revision of a project, ships it to every host of an
//! environment over ssh and rsync, and provisions the remote site (requirements,
//! migrations, static files, permissions, reload) behind a maintenance page.
//!
//! ## Architecture
//!
//! - `domain` - value objects and ports (remote shell, file transfer, VCS, events)
//! - `application` - deploy pipeline and the auxiliary tasks
//! - `infrastructure` - `ssh`, `rsync`, libgit2 and event sink implementations
//! - `config` - environments file and project settings
//! - `presentation` - CLI, wiring and terminal output

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{DeployResult, DeployUseCase, Task, TaskOutcome, TaskRunner};
pub use config::{Environment, ProjectConfig, RunContext};
pub use error::{HoistError, HoistResult};
