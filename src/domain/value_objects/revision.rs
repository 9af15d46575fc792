//! Deployment request and the revision it resolves to

use std::path::{Path, PathBuf};

/// What the operator asked to deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// Branch, tag or commit as typed by the operator
    pub git_ref: String,
    /// Upgrade already-installed requirements
    pub upgrade: bool,
}

impl DeploymentRequest {
    pub fn new(git_ref: impl Into<String>) -> Self {
        Self {
            git_ref: git_ref.into(),
            upgrade: false,
        }
    }

    pub fn with_upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }
}

/// A version reference resolved against the local repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Basename of the repository's working tree
    pub repository: String,
    /// Abbreviated commit hash
    pub commit: String,
    /// Currently checked-out branch (`HEAD` when detached)
    pub branch: String,
}

impl Revision {
    pub fn new(
        repository: impl Into<String>,
        commit: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            commit: commit.into(),
            branch: branch.into(),
        }
    }

    /// `blob-<repository>-<commit>`; depends on nothing else
    pub fn snapshot_name(&self) -> String {
        format!("blob-{}-{}", self.repository, self.commit)
    }

    pub fn snapshot_dir(&self, root: &Path) -> PathBuf {
        root.join(self.snapshot_name())
    }
}
