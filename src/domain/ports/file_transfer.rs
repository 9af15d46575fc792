//! File Transfer Port
//!
//! One-way directory synchronisation from the local machine to a host.

use std::path::Path;

use crate::domain::value_objects::HostTarget;
use crate::error::HoistResult;

/// How a directory is mirrored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSpec {
    /// Delete remote files that do not exist locally
    pub delete: bool,
    /// Force permission bits on every transferred file (e.g. `750`)
    pub chmod: Option<String>,
    /// Patterns never transferred and never deleted remotely
    pub excludes: Vec<String>,
}

impl SyncSpec {
    pub fn mirror() -> Self {
        Self {
            delete: true,
            ..Self::default()
        }
    }

    pub fn with_chmod(mut self, mode: impl Into<String>) -> Self {
        self.chmod = Some(mode.into());
        self
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }
}

/// Strategy for pushing a directory to a host
pub trait FileTransfer {
    /// Name of the transfer method (for logging)
    fn name(&self) -> &'static str;

    /// Mirror the contents of `local_dir` into `remote_dir` on `host`
    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()>;
}

impl<T: FileTransfer + ?Sized> FileTransfer for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()> {
        (**self).push(host, local_dir, remote_dir, spec)
    }
}

impl<T: FileTransfer + ?Sized> FileTransfer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn push(
        &self,
        host: &HostTarget,
        local_dir: &Path,
        remote_dir: &str,
        spec: &SyncSpec,
    ) -> HoistResult<()> {
        (**self).push(host, local_dir, remote_dir, spec)
    }
}
