//! Task dispatch
//!
//! `deploy` goes through [`DeployUseCase`]; every other task runs once per host,
//! in host order, through scoped sessions.

use crate::application::deploy::{DeployResult, DeployUseCase};
use crate::application::maintenance::MaintenanceToggle;
use crate::application::provision::{
    bower_install_command, collectstatic_command, frontend_overlay, install_requirements_command,
    migrate_command, open_site_session, register_command,
};
use crate::application::session::RemoteSession;
use crate::config::RunContext;
use crate::domain::ports::{
    DeployEvent, DeployEventSink, FileTransfer, RemoteShell, VersionControl,
};
use crate::domain::value_objects::{join, quote, HostTarget, ManageArgs, RemoteCommand};
use crate::error::HoistResult;

use super::Task;

/// What a finished task reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Deployed(DeployResult),
    Completed { task: &'static str, hosts: Vec<String> },
}

pub struct TaskRunner<'a> {
    shell: &'a dyn RemoteShell,
    transfer: &'a dyn FileTransfer,
    vcs: &'a dyn VersionControl,
    ctx: &'a RunContext,
    events: &'a dyn DeployEventSink,
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        shell: &'a dyn RemoteShell,
        transfer: &'a dyn FileTransfer,
        vcs: &'a dyn VersionControl,
        ctx: &'a RunContext,
        events: &'a dyn DeployEventSink,
    ) -> Self {
        Self {
            shell,
            transfer,
            vcs,
            ctx,
            events,
        }
    }

    /// Fail on the first task whose required keys are missing
    pub fn check(&self, tasks: &[Task]) -> HoistResult<()> {
        for task in tasks {
            self.ctx.environment.require(task.required_keys())?;
        }
        Ok(())
    }

    /// Check every task's keys, then run them in order
    pub fn run_all(&self, tasks: &[Task]) -> HoistResult<Vec<TaskOutcome>> {
        self.check(tasks)?;
        tasks.iter().map(|task| self.run(task)).collect()
    }

    pub fn run(&self, task: &Task) -> HoistResult<TaskOutcome> {
        self.ctx.environment.require(task.required_keys())?;

        if let Task::Deploy(request) = task {
            let use_case = DeployUseCase::new(self.shell, self.transfer, self.vcs);
            return use_case
                .execute(self.ctx, request, self.events)
                .map(TaskOutcome::Deployed);
        }

        let mut hosts = Vec::new();
        for host in self.ctx.environment.hosts()? {
            let name = host.to_string();
            self.events.on_event(DeployEvent::TaskStarted {
                task: task.name().to_string(),
                host: name.clone(),
            });
            tracing::info!(task = task.name(), host = %name, "running task");

            self.run_on_host(task, host)?;

            self.events.on_event(DeployEvent::TaskCompleted {
                task: task.name().to_string(),
                host: name.clone(),
            });
            hosts.push(name);
        }

        Ok(TaskOutcome::Completed {
            task: task.name(),
            hosts,
        })
    }

    fn run_on_host(&self, task: &Task, host: &HostTarget) -> HoistResult<()> {
        match task {
            Task::Deploy(_) => Ok(()),
            Task::Maintenance(state) => {
                MaintenanceToggle::new(self.shell, self.transfer, self.ctx).apply(host, *state)
            }
            Task::CreateDb => self.createdb(host),
            Task::DropDb => self.dropdb(host),
            Task::ResetDb => {
                self.dropdb(host)?;
                self.createdb(host)?;
                self.site(host, &migrate_command(&ManageArgs::new()))
            }
            Task::Bootstrap => {
                self.createdb(host)?;
                let session = open_site_session(self.shell, host, self.ctx)?;
                session.run(&migrate_command(&ManageArgs::new()))?;
                if self.ctx.project.tools.bower {
                    session.run_with(&frontend_overlay(), &bower_install_command())?;
                }
                session.run(&collectstatic_command())?;
                Ok(())
            }
            Task::Migrate(args) => self.site(host, &migrate_command(args)),
            Task::MakeMigrations(args) => {
                self.site(host, &RemoteCommand::manage("makemigrations", args))
            }
            Task::LoadData { fixtures } => {
                let args = fixtures
                    .iter()
                    .fold(ManageArgs::new(), |args, f| args.positional(f.as_str()));
                self.site(host, &RemoteCommand::manage("loaddata", &args))
            }
            Task::CollectStatic => self.site(host, &collectstatic_command()),
            Task::InstallRequirements { upgrade } => {
                self.site(host, &install_requirements_command(self.ctx, *upgrade)?)
            }
            Task::RegisterDeployment { commit, branch } => {
                self.site(host, &register_command(self.ctx, commit, branch))
            }
            Task::CreateSuperuser => self.site(
                host,
                &RemoteCommand::manage("createsuperuser", &ManageArgs::new()).with_tty(),
            ),
            Task::StartApp { name } => self.site(
                host,
                &RemoteCommand::manage("startapp", &ManageArgs::new().positional(name.as_str())),
            ),
            Task::RunTests { app } => {
                let session = open_site_session(self.shell, host, self.ctx)?;
                let app = app.as_deref().map(quote).unwrap_or_default();
                session.run(&RemoteCommand::new(join(&[
                    "coverage run --source='.' manage.py test",
                    &app,
                ])))?;
                let project = &self.ctx.project_name;
                session.run(&RemoteCommand::new(format!(
                    "coverage html --omit={}/settings/*,{}/wsgi.py",
                    project, project
                )))?;
                Ok(())
            }
            Task::RunServer => {
                if self.ctx.project.tools.stylus {
                    self.stylus(host, false)?;
                }
                self.site(
                    host,
                    &RemoteCommand::manage(
                        "runserver_plus",
                        &ManageArgs::new().positional("0.0.0.0:8000"),
                    )
                    .with_tty(),
                )
            }
            Task::StylusCompile { watch } => self.stylus(host, *watch),
            Task::BowerInstallPackage { package } => {
                let session = open_site_session(self.shell, host, self.ctx)?;
                session.run_with(
                    &frontend_overlay(),
                    &RemoteCommand::new(format!("bower install {} --save", quote(package))),
                )?;
                Ok(())
            }
        }
    }

    /// One command in the activated site session
    fn site(&self, host: &HostTarget, command: &RemoteCommand) -> HoistResult<()> {
        open_site_session(self.shell, host, self.ctx)?.run(command)?;
        Ok(())
    }

    fn createdb(&self, host: &HostTarget) -> HoistResult<()> {
        RemoteSession::bare(self.shell, host).run(&RemoteCommand::new(format!(
            "createdb {} -l en_US.UTF-8 -E UTF8 -T template0",
            quote(&self.ctx.project_name)
        )))?;
        Ok(())
    }

    fn dropdb(&self, host: &HostTarget) -> HoistResult<()> {
        RemoteSession::bare(self.shell, host).run(&RemoteCommand::new(format!(
            "dropdb {}",
            quote(&self.ctx.project_name)
        )))?;
        Ok(())
    }

    fn stylus(&self, host: &HostTarget, watch: bool) -> HoistResult<()> {
        let mut command = RemoteCommand::new(join(&[
            "stylus -c",
            if watch { "-w" } else { "" },
            "assets/css/custom.styl",
        ]));
        if watch {
            command = command.with_tty();
        }
        open_site_session(self.shell, host, self.ctx)?.run_with(&frontend_overlay(), &command)?;
        Ok(())
    }
}
