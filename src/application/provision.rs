//! Provisioning pipeline
//!
//! Command builders for the site's management tasks, and the fixed sequence run
//! after each upload. Every command runs inside the site session; the first
//! failure aborts the remaining steps.

use crate::config::{EnvKey, RunContext};
use crate::domain::ports::{DeployEvent, DeployEventSink, RemoteShell};
use crate::domain::value_objects::{
    quote, HostTarget, ManageArgs, ProvisionStep, RemoteCommand, Revision,
};
use crate::error::HoistResult;

use super::session::{RemoteSession, SessionOverlay};

/// Variables the tracking client reads on the remote host
pub const TRACKING_ORGANIZATION_VAR: &str = "OPBEAT_ORGANIZATION_ID";
pub const TRACKING_APP_VAR: &str = "OPBEAT_APP_ID";
pub const TRACKING_TOKEN_VAR: &str = "OPBEAT_SECRET_TOKEN";

/// Keys every site-session task needs
pub const SITE_KEYS: &[EnvKey] = &[EnvKey::Hosts, EnvKey::SiteDir, EnvKey::DjangoSettings];

/// Open the "activated" site session: site dir as cwd, settings module exported
pub fn open_site_session<'a>(
    shell: &'a dyn RemoteShell,
    host: &'a HostTarget,
    ctx: &RunContext,
) -> HoistResult<RemoteSession<'a>> {
    let env = &ctx.environment;
    let settings = env.django_settings()?.to_string();
    Ok(RemoteSession::open(shell, host, env.site_dir()?)
        .with_env("DJANGO_SETTINGS_MODULE", settings))
}

/// Frontend tooling runs under nvm and with CI set
pub fn frontend_overlay() -> SessionOverlay {
    SessionOverlay::new()
        .prefix("nvm use stable")
        .env("CI", "true")
}

/// `pip install -r <site_dir>/requirements/<env>.txt` (`-Ur` when upgrading)
pub fn install_requirements_command(ctx: &RunContext, upgrade: bool) -> HoistResult<RemoteCommand> {
    let env = &ctx.environment;
    let path = normalize_remote_path(&format!(
        "{}/requirements/{}.txt",
        env.site_dir()?,
        env.requirements_name()
    ));
    Ok(RemoteCommand::new(format!(
        "pip install -{}r {}",
        if upgrade { "U" } else { "" },
        quote(&path)
    )))
}

pub fn migrate_command(args: &ManageArgs) -> RemoteCommand {
    RemoteCommand::manage("migrate", args)
}

pub fn collectstatic_command() -> RemoteCommand {
    RemoteCommand::manage("collectstatic", &ManageArgs::new().option("noinput", "true"))
}

pub fn bower_install_command() -> RemoteCommand {
    RemoteCommand::new("bower install")
}

/// Tracking-service registration; credentials are expanded by the remote shell
pub fn register_command(ctx: &RunContext, commit: &str, branch: &str) -> RemoteCommand {
    RemoteCommand::new(format!(
        "{} -o ${} -a ${} -t ${} deployment --component path:. vcs:git rev:{} branch:{}",
        ctx.project.tracking.program,
        TRACKING_ORGANIZATION_VAR,
        TRACKING_APP_VAR,
        TRACKING_TOKEN_VAR,
        quote(commit),
        quote(branch)
    ))
}

/// Collapse `.` and `..` in an absolute or relative POSIX path
pub fn normalize_remote_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Runs the post-upload steps on one host
pub struct Provisioner<'a> {
    ctx: &'a RunContext,
    events: &'a dyn DeployEventSink,
}

impl<'a> Provisioner<'a> {
    pub fn new(ctx: &'a RunContext, events: &'a dyn DeployEventSink) -> Self {
        Self { ctx, events }
    }

    /// Run every applicable step in order; returns the steps that ran
    pub fn run(
        &self,
        session: &RemoteSession<'_>,
        revision: &Revision,
        upgrade: bool,
    ) -> HoistResult<Vec<ProvisionStep>> {
        let host = session.host().to_string();
        let mut completed = Vec::new();

        for step in ProvisionStep::ALL {
            if step == ProvisionStep::BowerInstall && !self.ctx.project.tools.bower {
                self.events.on_event(DeployEvent::StepSkipped {
                    host: host.clone(),
                    step,
                    reason: "bower is disabled for this project".to_string(),
                });
                continue;
            }

            self.events.on_event(DeployEvent::StepStarted {
                host: host.clone(),
                step,
            });
            tracing::info!(host = %host, step = %step, "provisioning step");

            self.run_step(session, step, revision, upgrade)?;

            self.events.on_event(DeployEvent::StepCompleted {
                host: host.clone(),
                step,
            });
            completed.push(step);
        }

        Ok(completed)
    }

    fn run_step(
        &self,
        session: &RemoteSession<'_>,
        step: ProvisionStep,
        revision: &Revision,
        upgrade: bool,
    ) -> HoistResult<()> {
        let env = &self.ctx.environment;
        let deploy = &self.ctx.project.deploy;

        match step {
            ProvisionStep::InstallRequirements => {
                session.run(&install_requirements_command(self.ctx, upgrade)?)?;
            }
            ProvisionStep::Migrate => {
                session.run(&migrate_command(&ManageArgs::new().option("noinput", "true")))?;
            }
            ProvisionStep::BowerInstall => {
                session.run_with(&frontend_overlay(), &bower_install_command())?;
            }
            ProvisionStep::CollectStatic => {
                session.run(&collectstatic_command())?;
            }
            ProvisionStep::Permissions => {
                let group = quote(env.group()?);
                session.run(&RemoteCommand::new(format!("chgrp -R {} .", group)))?;
                session.run(&RemoteCommand::new(format!(
                    "chgrp -R {} {}",
                    group,
                    quote(&deploy.media_dir)
                )))?;
            }
            ProvisionStep::ReloadWebserver => {
                session.run(&RemoteCommand::new(format!(
                    "touch {}",
                    quote(&deploy.reload_sentinel)
                )))?;
            }
            ProvisionStep::RestartWorkers => {
                session.run(&RemoteCommand::new(format!(
                    "sudo {} restart {}-{}",
                    deploy.supervisorctl,
                    env.user()?,
                    deploy.worker_suffix
                )))?;
            }
            ProvisionStep::RegisterDeployment => {
                session.run(&register_command(
                    self.ctx,
                    &revision.commit,
                    &revision.branch,
                ))?;
            }
        }

        Ok(())
    }
}
