//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod command;
mod host;
mod revision;
mod step;
mod toggle;

pub use command::{join, quote, ManageArgs, RemoteCommand};
pub use host::HostTarget;
pub use revision::{DeploymentRequest, Revision};
pub use step::{DeployPhase, ProvisionStep};
pub use toggle::{parse_flag, MaintenanceState};
