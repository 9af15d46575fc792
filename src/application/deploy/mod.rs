//! Deploy Module
//!
//! Ships one git reference to every host of the selected environment.
//!
//! ## Structure
//!
//! - `result` - Result types (`DeployResult`)
//! - `use_case` - Core use case logic (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use hoist::application::deploy::DeployUseCase;
//!
//! let use_case = DeployUseCase::new(shell, transfer, vcs);
//! let result = use_case.execute(&ctx, &DeploymentRequest::new("v1.2.0"), &sink)?;
//! ```

mod result;
mod use_case;

pub use result::{DeployResult, HostReport};
pub use use_case::{DeployUseCase, DEPLOY_KEYS};

#[cfg(test)]
mod tests;
