//! Version Control Port

use std::path::Path;

use crate::domain::value_objects::Revision;
use crate::error::HoistResult;

/// Read-only access to the local repository
pub trait VersionControl {
    /// Resolve a branch, tag or commit to a short hash, plus branch and repo name
    fn resolve(&self, reference: &str) -> HoistResult<Revision>;

    /// Write the contents of `subtree` at `commit` into `dest`.
    ///
    /// The subtree prefix is stripped: `src/a.py` lands at `dest/a.py`.
    /// Returns the number of files written.
    fn export_subtree(&self, commit: &str, subtree: &Path, dest: &Path) -> HoistResult<usize>;
}

impl<T: VersionControl + ?Sized> VersionControl for &T {
    fn resolve(&self, reference: &str) -> HoistResult<Revision> {
        (**self).resolve(reference)
    }

    fn export_subtree(&self, commit: &str, subtree: &Path, dest: &Path) -> HoistResult<usize> {
        (**self).export_subtree(commit, subtree, dest)
    }
}

impl<T: VersionControl + ?Sized> VersionControl for Box<T> {
    fn resolve(&self, reference: &str) -> HoistResult<Revision> {
        (**self).resolve(reference)
    }

    fn export_subtree(&self, commit: &str, subtree: &Path, dest: &Path) -> HoistResult<usize> {
        (**self).export_subtree(commit, subtree, dest)
    }
}
