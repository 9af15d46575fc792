//! Configuration module for hoist
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (HOIST_*)
//! 3. `environments.json` (selected entry) and `hoist.toml`
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{
    closest, levenshtein, load_environment, load_project_config, resolve_environments_path,
    with_env_overrides, ConfigWarning, ENVIRONMENTS_FILE, PROJECT_FILE,
};
pub use types::{
    DeployConfig, EnvKey, Environment, EnvironmentEntry, EnvironmentFile, ProjectConfig,
    ProjectSection, RunContext, SshConfig, ToolsConfig, TrackingConfig,
};
