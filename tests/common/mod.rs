//! Common test utilities for hoist CLI tests.
//!
//! Provides `TestEnv`: a temporary git repository laid out like a deployable
//! project, with an environments file and helpers to run the binary against it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

pub const ENVIRONMENTS: &str = r#"{
    "staging": {
        "hosts": ["deploy@web1.example.com"],
        "user": "luke",
        "group": "www-data",
        "site_dir": "/srv/luke/site",
        "maintenance_dir": "/srv/luke/maintenance",
        "django_settings": "luke.settings.staging"
    },
    "production": {
        "hosts": ["web1.example.com", "web2.example.com:2222"],
        "user": "luke",
        "group": "www-data",
        "site_dir": "/srv/luke/site",
        "maintenance_dir": "/srv/luke/maintenance",
        "django_settings": "luke.settings.production"
    },
    "partial": {
        "hosts": ["web1.example.com"],
        "site_dir": "/srv/luke/site"
    }
}
"#;

/// Result of running the hoist binary
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// stdout parsed as NDJSON
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l).unwrap_or_else(|e| panic!("bad json line {:?}: {}", l, e))
            })
            .collect()
    }
}

/// A committed project named `luke` inside a temp directory
pub struct TestEnv {
    temp: TempDir,
    root: PathBuf,
    snapshots: PathBuf,
    repo: Repository,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("luke");
        let snapshots = temp.path().join("snapshots");
        fs::create_dir_all(&snapshots).unwrap();

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&root, &opts).expect("Failed to init repository");

        let env = Self {
            temp,
            root,
            snapshots,
            repo,
        };
        env.write_file("src/manage.py", "#!/usr/bin/env python\n");
        env.write_file("src/luke/__init__.py", "");
        env.write_file("maintenance/index.html", "<h1>Back soon</h1>\n");
        env.write_file("README.md", "luke\n");
        env.commit("initial");
        env.write_file("environments.json", ENVIRONMENTS);
        env
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_root(&self) -> &Path {
        &self.snapshots
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Commit everything in the working tree; returns the abbreviated id
    pub fn commit(&self, message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Hoist Test", "test@example.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| self.repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();

        let object = self.repo.find_object(oid, None).unwrap();
        object.short_id().unwrap().as_str().unwrap().to_string()
    }

    pub fn tag(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .unwrap();
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_hoist"));
        cmd.current_dir(&self.root)
            .args(args)
            .env_remove("HOIST_ENV")
            .env_remove("HOIST_ENVIRONMENTS")
            .env_remove("HOIST_SSH_MULTIPLEX")
            .env_remove("RUST_LOG")
            .env("HOIST_SNAPSHOT_ROOT", &self.snapshots)
            .env("HOME", self.temp.path())
            .env("XDG_CONFIG_HOME", self.temp.path().join("config"))
            .env("NO_COLOR", "1");

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute hoist");
        to_result(output)
    }

    /// Names of everything left in the snapshot root
    pub fn leftover_snapshots(&self) -> Vec<String> {
        fs::read_dir(&self.snapshots)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect()
    }
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
