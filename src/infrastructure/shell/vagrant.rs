//! Vagrant key discovery
//!
//! The `vagrant` environment logs in with the VM's generated key, which
//! `vagrant ssh-config` reports as `IdentityFile`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{HoistError, HoistResult};

/// Environment name that triggers key discovery
pub const VAGRANT_ENVIRONMENT: &str = "vagrant";

/// Ask `vagrant ssh-config` (run in `project_dir`) for the identity file
pub fn discover_identity_file(project_dir: &Path) -> HoistResult<PathBuf> {
    let output = Command::new("vagrant")
        .arg("ssh-config")
        .current_dir(project_dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| HoistError::SpawnFailed {
            program: "vagrant".to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(HoistError::CommandFailed {
            host: "local".to_string(),
            command: "vagrant ssh-config".to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let key = parse_identity_file(&stdout).ok_or_else(|| HoistError::CommandFailed {
        host: "local".to_string(),
        command: "vagrant ssh-config".to_string(),
        code: None,
        stderr: "no IdentityFile in output".to_string(),
    })?;
    tracing::debug!(key = %key.display(), "vagrant identity file");
    Ok(key)
}

/// First `IdentityFile` value of an ssh-config dump, quotes stripped
pub fn parse_identity_file(ssh_config: &str) -> Option<PathBuf> {
    ssh_config.lines().find_map(|line| {
        let line = line.trim();
        let (key, value) = line.split_once(char::is_whitespace)?;
        if !key.eq_ignore_ascii_case("IdentityFile") {
            return None;
        }
        let value = value.trim().replace('"', "");
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}
