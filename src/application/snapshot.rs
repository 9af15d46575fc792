//! Snapshot builder
//!
//! Materialises the project's source subtree at a given revision into a
//! deterministic local directory, the unit that gets uploaded.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::ports::VersionControl;
use crate::domain::value_objects::Revision;
use crate::error::HoistResult;

/// A locally materialised copy of the source subtree at one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub revision: Revision,
    pub dir: PathBuf,
    pub file_count: usize,
}

pub struct SnapshotBuilder<'a> {
    vcs: &'a dyn VersionControl,
    root: PathBuf,
    subtree: PathBuf,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(vcs: &'a dyn VersionControl, root: impl Into<PathBuf>, subtree: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            root: root.into(),
            subtree: subtree.into(),
        }
    }

    /// Resolve `reference` without touching the filesystem
    pub fn resolve(&self, reference: &str) -> HoistResult<Revision> {
        self.vcs.resolve(reference)
    }

    /// Recreate the snapshot directory for an already resolved revision
    pub fn materialize(&self, revision: Revision) -> HoistResult<Snapshot> {
        let dir = revision.snapshot_dir(&self.root);

        remove_dir_if_present(&dir)?;
        fs::create_dir_all(&dir)?;

        let file_count = self
            .vcs
            .export_subtree(&revision.commit, &self.subtree, &dir)?;
        tracing::info!(
            commit = %revision.commit,
            dir = %dir.display(),
            files = file_count,
            "snapshot created"
        );

        Ok(Snapshot {
            revision,
            dir,
            file_count,
        })
    }

    pub fn build(&self, reference: &str) -> HoistResult<Snapshot> {
        let revision = self.resolve(reference)?;
        self.materialize(revision)
    }
}

/// Delete a snapshot directory; a missing directory is fine
pub fn remove_snapshot(snapshot: &Snapshot) -> HoistResult<()> {
    remove_dir_if_present(&snapshot.dir)?;
    tracing::debug!(dir = %snapshot.dir.display(), "snapshot removed");
    Ok(())
}

fn remove_dir_if_present(dir: &Path) -> HoistResult<()> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dir)?,
        Ok(_) => fs::remove_file(dir)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
