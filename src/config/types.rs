//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::value_objects::HostTarget;
use crate::error::{HoistError, HoistResult};

/// One environment as written in `environments.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentEntry {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub key_filename: Option<PathBuf>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub site_dir: Option<String>,
    #[serde(default)]
    pub maintenance_dir: Option<String>,
    #[serde(default)]
    pub django_settings: Option<String>,
}

/// The whole `environments.json` document: name → entry
pub type EnvironmentFile = BTreeMap<String, EnvironmentEntry>;

/// Keys a task can require from the selected environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKey {
    Hosts,
    User,
    Group,
    SiteDir,
    MaintenanceDir,
    DjangoSettings,
}

impl EnvKey {
    pub fn name(&self) -> &'static str {
        match self {
            EnvKey::Hosts => "hosts",
            EnvKey::User => "user",
            EnvKey::Group => "group",
            EnvKey::SiteDir => "site_dir",
            EnvKey::MaintenanceDir => "maintenance_dir",
            EnvKey::DjangoSettings => "django_settings",
        }
    }
}

/// The selected environment, immutable for the rest of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    hosts: Vec<HostTarget>,
    key_filename: Option<PathBuf>,
    user: Option<String>,
    group: Option<String>,
    site_dir: Option<String>,
    maintenance_dir: Option<String>,
    django_settings: Option<String>,
}

impl Environment {
    /// Build from a raw entry; host strings are validated here
    pub fn from_entry(name: impl Into<String>, entry: EnvironmentEntry) -> HoistResult<Self> {
        let hosts = entry
            .hosts
            .iter()
            .map(|h| h.parse::<HostTarget>())
            .collect::<HoistResult<Vec<_>>>()?;

        Ok(Self {
            name: name.into(),
            hosts,
            key_filename: entry.key_filename,
            user: non_empty(entry.user),
            group: non_empty(entry.group),
            site_dir: non_empty(entry.site_dir),
            maintenance_dir: non_empty(entry.maintenance_dir),
            django_settings: non_empty(entry.django_settings),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_filename(&self) -> Option<&Path> {
        self.key_filename.as_deref()
    }

    /// Set the ssh identity only when the environments file did not
    pub fn with_default_key_filename(mut self, key: PathBuf) -> Self {
        if self.key_filename.is_none() {
            self.key_filename = Some(key);
        }
        self
    }

    /// Fail with the first missing key, before anything runs
    pub fn require(&self, keys: &[EnvKey]) -> HoistResult<()> {
        for key in keys {
            let present = match key {
                EnvKey::Hosts => !self.hosts.is_empty(),
                EnvKey::User => self.user.is_some(),
                EnvKey::Group => self.group.is_some(),
                EnvKey::SiteDir => self.site_dir.is_some(),
                EnvKey::MaintenanceDir => self.maintenance_dir.is_some(),
                EnvKey::DjangoSettings => self.django_settings.is_some(),
            };
            if !present {
                return Err(self.missing(*key));
            }
        }
        Ok(())
    }

    pub fn hosts(&self) -> HoistResult<&[HostTarget]> {
        self.require(&[EnvKey::Hosts])?;
        Ok(&self.hosts)
    }

    /// Login user; optional for ssh, required for worker names
    pub fn user_opt(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn user(&self) -> HoistResult<&str> {
        self.user.as_deref().ok_or_else(|| self.missing(EnvKey::User))
    }

    pub fn group(&self) -> HoistResult<&str> {
        self.group.as_deref().ok_or_else(|| self.missing(EnvKey::Group))
    }

    pub fn site_dir(&self) -> HoistResult<&str> {
        self.site_dir
            .as_deref()
            .ok_or_else(|| self.missing(EnvKey::SiteDir))
    }

    pub fn maintenance_dir(&self) -> HoistResult<&str> {
        self.maintenance_dir
            .as_deref()
            .ok_or_else(|| self.missing(EnvKey::MaintenanceDir))
    }

    pub fn django_settings(&self) -> HoistResult<&str> {
        self.django_settings
            .as_deref()
            .ok_or_else(|| self.missing(EnvKey::DjangoSettings))
    }

    /// Requirements file stem: the environment name, `vagrant` maps to `devel`
    pub fn requirements_name(&self) -> &str {
        if self.name == "vagrant" {
            "devel"
        } else {
            &self.name
        }
    }

    fn missing(&self, key: EnvKey) -> HoistError {
        HoistError::MissingEnvironmentKey {
            environment: self.name.clone(),
            key: key.name().to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Project settings (`hoist.toml`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// `[project]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectSection {
    /// Database and project name; defaults to the working directory name
    #[serde(default)]
    pub name: Option<String>,
    /// Repository subtree that becomes the site directory
    #[serde(default = "default_source_subtree")]
    pub source_subtree: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            source_subtree: default_source_subtree(),
        }
    }
}

fn default_source_subtree() -> PathBuf {
    PathBuf::from("src")
}

/// `[tools]` - optional frontend tooling the project uses
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub stylus: bool,
    #[serde(default)]
    pub bower: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            stylus: true,
            bower: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[deploy]` - remote layout and transfer settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeployConfig {
    /// Local directory mirrored while maintenance is on
    #[serde(default = "default_maintenance_source")]
    pub maintenance_source: PathBuf,
    /// Patterns excluded from the code upload
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
    /// Mode forced on uploaded files
    #[serde(default = "default_chmod")]
    pub chmod: String,
    /// Where snapshots are materialised; system temp dir when unset
    #[serde(default)]
    pub snapshot_root: Option<PathBuf>,
    /// Webserver reload sentinel, relative to the site directory
    #[serde(default = "default_reload_sentinel")]
    pub reload_sentinel: String,
    /// Media directory, relative to the site directory
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    #[serde(default = "default_supervisorctl")]
    pub supervisorctl: String,
    /// Supervisor program is `<user>-<worker_suffix>`
    #[serde(default = "default_worker_suffix")]
    pub worker_suffix: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            maintenance_source: default_maintenance_source(),
            excludes: default_excludes(),
            chmod: default_chmod(),
            snapshot_root: None,
            reload_sentinel: default_reload_sentinel(),
            media_dir: default_media_dir(),
            supervisorctl: default_supervisorctl(),
            worker_suffix: default_worker_suffix(),
        }
    }
}

impl DeployConfig {
    pub fn snapshot_root(&self) -> PathBuf {
        self.snapshot_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn default_maintenance_source() -> PathBuf {
    PathBuf::from("maintenance")
}

fn default_excludes() -> Vec<String> {
    ["*.pyc", "env/", "cover/", "*.style", "bower_components"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_chmod() -> String {
    "750".to_string()
}

fn default_reload_sentinel() -> String {
    "../reload".to_string()
}

fn default_media_dir() -> String {
    "../media".to_string()
}

fn default_supervisorctl() -> String {
    "/usr/bin/supervisorctl".to_string()
}

fn default_worker_suffix() -> String {
    "celeryd".to_string()
}

/// `[ssh]`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SshConfig {
    /// Reuse one master connection per host while a session is open
    #[serde(default)]
    pub multiplex: bool,
}

/// `[tracking]` - deployment-tracking service client
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_program")]
    pub program: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            program: default_tracking_program(),
        }
    }
}

fn default_tracking_program() -> String {
    "opbeat".to_string()
}

/// Everything a task needs, loaded once and never mutated
#[derive(Debug, Clone)]
pub struct RunContext {
    pub environment: Environment,
    pub project: ProjectConfig,
    /// Resolved project name (`[project].name` or working directory name)
    pub project_name: String,
}

impl RunContext {
    pub fn new(environment: Environment, project: ProjectConfig, fallback_name: &str) -> Self {
        let project_name = project
            .project
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string());
        Self {
            environment,
            project,
            project_name,
        }
    }
}
