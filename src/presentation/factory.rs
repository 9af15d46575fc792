//! Runtime Factory
//!
//! Loads configuration and wires infrastructure into the ports the task
//! runner expects. This is the dependency injection point for the binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::tasks::TaskRunner;
use crate::config::{
    load_environment, load_project_config, resolve_environments_path, with_env_overrides,
    ConfigWarning, RunContext,
};
use crate::domain::ports::{DeployEventSink, FileTransfer, RemoteShell, VersionControl};
use crate::error::{HoistError, HoistResult};
use crate::infrastructure::shell::{discover_identity_file, VAGRANT_ENVIRONMENT};
use crate::infrastructure::{
    DryRunLog, DryRunShell, DryRunTransfer, GitRepository, JsonEventSink, RsyncTransfer,
    SshOptions, SshShell,
};

use super::console::ConsoleEventSink;
use super::theme::Palette;

/// Where to load settings from and how to execute
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub cwd: PathBuf,
    pub environment: String,
    pub environments_file: Option<PathBuf>,
    pub config_file: PathBuf,
    pub json: bool,
    pub dry_run: bool,
    pub palette: Palette,
}

/// Loaded context plus the concrete ports for one invocation
pub struct Runtime {
    pub ctx: RunContext,
    pub warnings: Vec<ConfigWarning>,
    shell: Box<dyn RemoteShell>,
    transfer: Box<dyn FileTransfer>,
    vcs: Box<dyn VersionControl>,
    events: Box<dyn DeployEventSink>,
}

impl Runtime {
    pub fn runner(&self) -> TaskRunner<'_> {
        TaskRunner::new(
            &*self.shell,
            &*self.transfer,
            &*self.vcs,
            &self.ctx,
            &*self.events,
        )
    }
}

/// Pick the environment name: the `environment:` task wins over `--env`
pub fn select_environment(
    from_tasks: Option<String>,
    from_flag: Option<String>,
) -> HoistResult<String> {
    from_tasks
        .or(from_flag)
        .filter(|name| !name.trim().is_empty())
        .ok_or(HoistError::EnvironmentNotSelected)
}

/// Load configuration for the selected environment
pub fn load_context(options: &RuntimeOptions) -> HoistResult<(RunContext, Vec<ConfigWarning>)> {
    let environments_path =
        resolve_environments_path(options.environments_file.as_deref(), &options.cwd);
    let (mut environment, mut warnings) =
        load_environment(&environments_path, &options.environment)?;

    let config_path = absolutize(&options.cwd, &options.config_file);
    let (project, project_warnings) = load_project_config(&config_path)?;
    warnings.extend(project_warnings);
    let project = with_env_overrides(project);

    if environment.name() == VAGRANT_ENVIRONMENT && !options.dry_run {
        let key = discover_identity_file(&options.cwd)?;
        environment = environment.with_default_key_filename(key);
    }

    let fallback_name = options
        .cwd
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok((RunContext::new(environment, project, &fallback_name), warnings))
}

/// Create the runtime with all dependencies wired up
pub fn create_runtime(options: &RuntimeOptions) -> HoistResult<Runtime> {
    let (ctx, warnings) = load_context(options)?;

    let ssh_options = SshOptions::default()
        .with_key(ctx.environment.key_filename().map(Path::to_path_buf))
        .with_default_user(ctx.environment.user_opt().map(str::to_string))
        .with_multiplex(ctx.project.ssh.multiplex && !options.dry_run)
        .with_capture(options.json);
    let ssh = Arc::new(SshShell::new(ssh_options)?);

    let (shell, transfer): (Box<dyn RemoteShell>, Box<dyn FileTransfer>) = if options.dry_run {
        // JSON events own stdout
        let log = if options.json {
            DryRunLog::stderr()
        } else {
            DryRunLog::stdout()
        };
        (
            Box::new(DryRunShell::new(log.clone())),
            Box::new(DryRunTransfer::new(RsyncTransfer::new(ssh), log)),
        )
    } else {
        if !RsyncTransfer::check_available() {
            tracing::warn!("rsync not found in PATH; uploads will fail");
        }
        (
            Box::new(ssh.clone()),
            Box::new(RsyncTransfer::new(ssh)),
        )
    };

    let vcs = GitRepository::discover(&options.cwd)?;
    tracing::debug!(root = %vcs.root().display(), "repository");

    let events: Box<dyn DeployEventSink> = if options.json {
        Box::new(JsonEventSink::stdout())
    } else {
        Box::new(ConsoleEventSink::stdout(options.palette))
    };

    Ok(Runtime {
        ctx,
        warnings,
        shell,
        transfer,
        vcs: Box::new(vcs),
        events,
    })
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
