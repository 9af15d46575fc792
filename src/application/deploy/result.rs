//! Deploy Result
//!
//! Result types for deploy operations.

use std::path::PathBuf;

use crate::domain::value_objects::{ProvisionStep, Revision};

/// What happened on one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostReport {
    pub host: String,
    /// Provisioning steps that ran, in order
    pub steps: Vec<ProvisionStep>,
}

/// Result of a successful deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployResult {
    /// Reference as given by the operator
    pub git_ref: String,
    pub revision: Revision,
    /// Snapshot location (already removed)
    pub snapshot_dir: PathBuf,
    /// Files exported into the snapshot
    pub file_count: usize,
    pub hosts: Vec<HostReport>,
}

impl DeployResult {
    pub fn host_names(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.host.clone()).collect()
    }
}
