//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::parse_flag;
use crate::error::{HoistError, HoistResult};

use super::types::{Environment, EnvironmentFile, ProjectConfig};

/// Default environments file name, looked up in the working directory
pub const ENVIRONMENTS_FILE: &str = "environments.json";

/// Default project config file name
pub const PROJECT_FILE: &str = "hoist.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

/// Pick the environments file: explicit path, then `./environments.json`,
/// then `~/.config/hoist/environments.json`.
///
/// Falls back to the working-directory path so the read error names it.
pub fn resolve_environments_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let local = cwd.join(ENVIRONMENTS_FILE);
    if local.exists() {
        return local;
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("hoist").join(ENVIRONMENTS_FILE);
        if user.exists() {
            return user;
        }
    }

    local
}

/// Load `name` from the environments file
pub fn load_environment(path: &Path, name: &str) -> HoistResult<(Environment, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| HoistError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(&content);
    let environments: EnvironmentFile = serde_ignored::deserialize(&mut deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| HoistError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let Some(entry) = environments.get(name).cloned() else {
        let names: Vec<&str> = environments.keys().map(String::as_str).collect();
        let suggestion = closest(name, &names)
            .map(|s| format!(". Did you mean '{}'?", s))
            .unwrap_or_default();
        return Err(HoistError::UnknownEnvironment {
            name: name.to_string(),
            file: path.to_path_buf(),
            suggestion,
        });
    };

    // Only warn about keys of the environment actually in use
    let prefix = format!("{}.", name);
    let warnings = unknown_paths
        .into_iter()
        .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
        .map(|key| warning(&content, path, key, ENVIRONMENT_KEYS))
        .collect();

    Ok((Environment::from_entry(name, entry)?, warnings))
}

/// Load project settings; a missing file yields defaults
pub fn load_project_config(path: &Path) -> HoistResult<(ProjectConfig, Vec<ConfigWarning>)> {
    if !path.exists() {
        return Ok((ProjectConfig::default(), Vec::new()));
    }

    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);
    let config: ProjectConfig = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| HoistError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            warning(&content, path, key, PROJECT_KEYS)
        })
        .collect();

    Ok((config, warnings))
}

/// Apply environment variable overrides (HOIST_* prefix)
pub fn with_env_overrides(config: ProjectConfig) -> ProjectConfig {
    apply_overrides(config, |name| std::env::var(name).ok())
}

pub(crate) fn apply_overrides(
    mut config: ProjectConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProjectConfig {
    // HOIST_SSH_MULTIPLEX
    if let Some(val) = lookup("HOIST_SSH_MULTIPLEX") {
        match parse_flag(&val) {
            Some(multiplex) => config.ssh.multiplex = multiplex,
            None => tracing::warn!(value = %val, "ignoring unrecognised HOIST_SSH_MULTIPLEX"),
        }
    }

    // HOIST_SNAPSHOT_ROOT
    if let Some(root) = lookup("HOIST_SNAPSHOT_ROOT") {
        if !root.trim().is_empty() {
            config.deploy.snapshot_root = Some(PathBuf::from(root));
        }
    }

    config
}

const ENVIRONMENT_KEYS: &[&str] = &[
    "hosts",
    "key_filename",
    "user",
    "group",
    "site_dir",
    "maintenance_dir",
    "django_settings",
];

const PROJECT_KEYS: &[&str] = &[
    "project",
    "name",
    "source_subtree",
    "tools",
    "stylus",
    "bower",
    "deploy",
    "maintenance_source",
    "excludes",
    "chmod",
    "snapshot_root",
    "reload_sentinel",
    "media_dir",
    "supervisorctl",
    "worker_suffix",
    "ssh",
    "multiplex",
    "tracking",
    "program",
];

fn warning(content: &str, file: &Path, key: String, candidates: &[&str]) -> ConfigWarning {
    ConfigWarning {
        line: find_line_number(content, &key),
        suggestion: closest(&key, candidates).map(str::to_string),
        file: file.to_path_buf(),
        key,
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

/// Closest candidate within two edits
pub fn closest<'a>(unknown: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate),
        _ => None,
    }
}

/// Simple Levenshtein distance for typo detection
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_bytes.len()]
}
