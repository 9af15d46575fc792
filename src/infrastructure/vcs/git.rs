//! Git repository access
//!
//! Reference resolution and subtree export go through libgit2 in-process, so
//! snapshots do not depend on a `git` or `tar` binary.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{ObjectType, Oid, Repository, Tree};

use crate::domain::ports::VersionControl;
use crate::domain::value_objects::Revision;
use crate::error::{HoistError, HoistResult};

const MODE_EXECUTABLE: i32 = 0o100755;
const MODE_SYMLINK: i32 = 0o120000;

pub struct GitRepository {
    repo: Repository,
    root: PathBuf,
}

impl GitRepository {
    /// Find the repository containing `path`
    pub fn discover(path: &Path) -> HoistResult<Self> {
        let not_a_repo = || HoistError::NotARepository {
            path: path.to_path_buf(),
        };
        let repo = Repository::discover(path).map_err(|_| not_a_repo())?;
        let root = repo.workdir().ok_or_else(not_a_repo)?.to_path_buf();
        Ok(Self { repo, root })
    }

    /// Working tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Basename of the working tree root
    pub fn name(&self) -> String {
        self.root
            .components()
            .next_back()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Checked-out branch, or `HEAD` when detached or unborn
    pub fn current_branch(&self) -> String {
        match self.repo.head() {
            Ok(head) if head.is_branch() => head.shorthand().unwrap_or("HEAD").to_string(),
            _ => "HEAD".to_string(),
        }
    }

    fn find_commit_oid(&self, reference: &str) -> HoistResult<Oid> {
        let unresolved = |e: git2::Error| HoistError::UnresolvedReference {
            reference: reference.to_string(),
            message: e.message().to_string(),
        };
        let object = self.repo.revparse_single(reference).map_err(unresolved)?;
        let commit = object.peel_to_commit().map_err(unresolved)?;
        Ok(commit.id())
    }

    fn write_tree(&self, tree: &Tree<'_>, dest: &Path) -> HoistResult<usize> {
        let mut written = 0;

        for entry in tree.iter() {
            let name = String::from_utf8_lossy(entry.name_bytes()).to_string();
            let path = dest.join(&name);

            match entry.kind() {
                Some(ObjectType::Tree) => {
                    fs::create_dir_all(&path)?;
                    let subtree = self.repo.find_tree(entry.id())?;
                    written += self.write_tree(&subtree, &path)?;
                }
                Some(ObjectType::Blob) => {
                    let blob = self.repo.find_blob(entry.id())?;
                    write_blob(&path, blob.content(), entry.filemode())?;
                    written += 1;
                }
                // submodules export as empty directories
                Some(ObjectType::Commit) => fs::create_dir_all(&path)?,
                _ => {}
            }
        }

        Ok(written)
    }
}

fn write_blob(path: &Path, content: &[u8], mode: i32) -> HoistResult<()> {
    if mode == MODE_SYMLINK {
        #[cfg(unix)]
        {
            let target = String::from_utf8_lossy(content).to_string();
            std::os::unix::fs::symlink(target, path)?;
            return Ok(());
        }
    }

    fs::write(path, content)?;

    #[cfg(unix)]
    if mode == MODE_EXECUTABLE {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

impl VersionControl for GitRepository {
    fn resolve(&self, reference: &str) -> HoistResult<Revision> {
        let oid = self.find_commit_oid(reference)?;
        let object = self.repo.find_object(oid, Some(ObjectType::Commit))?;
        let short = object.short_id()?;
        let commit = short
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| oid.to_string()[..7].to_string());

        Ok(Revision::new(self.name(), commit, self.current_branch()))
    }

    fn export_subtree(&self, commit: &str, subtree: &Path, dest: &Path) -> HoistResult<usize> {
        let missing = || HoistError::SubtreeMissing {
            subtree: subtree.to_path_buf(),
            commit: commit.to_string(),
        };

        let oid = self.find_commit_oid(commit)?;
        let tree = self.repo.find_commit(oid)?.tree()?;
        let entry = tree.get_path(subtree).map_err(|_| missing())?;
        if entry.kind() != Some(ObjectType::Tree) {
            return Err(missing());
        }
        let subtree = self.repo.find_tree(entry.id())?;

        self.write_tree(&subtree, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, RepositoryInitOptions, Signature};
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) -> Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Hoist Test", "test@example.com").unwrap();

        let parent = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn project() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("luke");
        fs::create_dir_all(root.join("src/luke")).unwrap();
        fs::write(root.join("src/manage.py"), "#!/usr/bin/env python\n").unwrap();
        fs::write(root.join("src/luke/__init__.py"), "").unwrap();
        fs::write(root.join("README.md"), "luke\n").unwrap();

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&root, &opts).unwrap();
        commit_all(&repo, "initial");
        (temp, repo)
    }

    #[test]
    fn resolves_reference_branch_and_name() {
        let (temp, repo) = project();
        let head = repo.head().unwrap().target().unwrap();
        let git = GitRepository::discover(&temp.path().join("luke/src")).unwrap();

        let revision = git.resolve("main").unwrap();

        assert_eq!(revision.repository, "luke");
        assert_eq!(revision.branch, "main");
        assert!(head.to_string().starts_with(&revision.commit));
        assert!(revision.commit.len() >= 7);
    }

    #[test]
    fn detached_head_reports_head() {
        let (temp, repo) = project();
        let head = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(head).unwrap();

        let git = GitRepository::discover(&temp.path().join("luke")).unwrap();
        assert_eq!(git.current_branch(), "HEAD");
    }

    #[test]
    fn unknown_reference_is_unresolved() {
        let (temp, _repo) = project();
        let git = GitRepository::discover(&temp.path().join("luke")).unwrap();

        let err = git.resolve("v9.9.9").unwrap_err();
        assert!(matches!(err, HoistError::UnresolvedReference { .. }));
    }

    #[test]
    fn exports_subtree_without_prefix() {
        let (temp, _repo) = project();
        let git = GitRepository::discover(&temp.path().join("luke")).unwrap();
        let revision = git.resolve("HEAD").unwrap();
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();

        let count = git
            .export_subtree(&revision.commit, Path::new("src"), &dest)
            .unwrap();

        assert_eq!(count, 2);
        assert!(dest.join("manage.py").is_file());
        assert!(dest.join("luke/__init__.py").is_file());
        assert!(!dest.join("README.md").exists());
        assert!(!dest.join("src").exists());
    }

    #[test]
    fn exports_committed_content_not_working_tree() {
        let (temp, repo) = project();
        let root = temp.path().join("luke");
        let first = repo.head().unwrap().target().unwrap().to_string();
        fs::write(root.join("src/manage.py"), "changed\n").unwrap();
        commit_all(&repo, "second");

        let git = GitRepository::discover(&root).unwrap();
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        git.export_subtree(&first[..7], Path::new("src"), &dest)
            .unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("manage.py")).unwrap(),
            "#!/usr/bin/env python\n"
        );
    }

    #[test]
    fn missing_subtree_is_reported() {
        let (temp, _repo) = project();
        let git = GitRepository::discover(&temp.path().join("luke")).unwrap();
        let dest = temp.path().join("out");

        let err = git
            .export_subtree("HEAD", Path::new("app"), &dest)
            .unwrap_err();
        assert!(matches!(err, HoistError::SubtreeMissing { .. }));

        let err = git
            .export_subtree("HEAD", Path::new("README.md"), &dest)
            .unwrap_err();
        assert!(matches!(err, HoistError::SubtreeMissing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn preserves_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, repo) = project();
        let root = temp.path().join("luke");
        let script = root.join("src/run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        commit_all(&repo, "script");

        let git = GitRepository::discover(&root).unwrap();
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        git.export_subtree("HEAD", Path::new("src"), &dest).unwrap();

        let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn outside_repository_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            GitRepository::discover(temp.path()),
            Err(HoistError::NotARepository { .. })
        ));
    }
}
