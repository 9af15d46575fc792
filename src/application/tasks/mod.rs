//! Tasks
//!
//! Every operator-visible operation is a [`Task`] variant with a fixed argument
//! schema. Tasks come from typed CLI subcommands or from task-style strings
//! (`deploy:v1.2.0,upgrade=yes`, see [`invocation`]), and are fully validated
//! before the first one runs.

pub mod invocation;
mod runner;

pub use invocation::{parse_invocation, parse_task, Invocation};
pub use runner::{TaskOutcome, TaskRunner};

use crate::application::deploy::DEPLOY_KEYS;
use crate::application::maintenance::MaintenanceToggle;
use crate::application::provision::SITE_KEYS;
use crate::config::EnvKey;
use crate::domain::value_objects::{DeploymentRequest, MaintenanceState, ManageArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Deploy(DeploymentRequest),
    Maintenance(MaintenanceState),
    RegisterDeployment { commit: String, branch: String },
    InstallRequirements { upgrade: bool },
    Migrate(ManageArgs),
    MakeMigrations(ManageArgs),
    CollectStatic,
    LoadData { fixtures: Vec<String> },
    CreateDb,
    DropDb,
    ResetDb,
    Bootstrap,
    CreateSuperuser,
    StartApp { name: String },
    RunTests { app: Option<String> },
    RunServer,
    StylusCompile { watch: bool },
    BowerInstallPackage { package: String },
}

impl Task {
    /// Task name as written in task-style invocations
    pub fn name(&self) -> &'static str {
        match self {
            Task::Deploy(_) => "deploy",
            Task::Maintenance(_) => "maintenance",
            Task::RegisterDeployment { .. } => "register_deployment",
            Task::InstallRequirements { .. } => "install_requirements",
            Task::Migrate(_) => "migrate",
            Task::MakeMigrations(_) => "makemigrations",
            Task::CollectStatic => "collectstatic",
            Task::LoadData { .. } => "loaddata",
            Task::CreateDb => "createdb",
            Task::DropDb => "dropdb",
            Task::ResetDb => "resetdb",
            Task::Bootstrap => "bootstrap",
            Task::CreateSuperuser => "createsuperuser",
            Task::StartApp { .. } => "startapp",
            Task::RunTests { .. } => "runtests",
            Task::RunServer => "runserver",
            Task::StylusCompile { .. } => "styluscompile",
            Task::BowerInstallPackage { .. } => "bower_install_package",
        }
    }

    /// Environment keys that must be present before the task is dispatched
    pub fn required_keys(&self) -> &'static [EnvKey] {
        match self {
            Task::Deploy(_) => DEPLOY_KEYS,
            Task::Maintenance(state) => MaintenanceToggle::required_keys(*state),
            Task::CreateDb | Task::DropDb => &[EnvKey::Hosts],
            _ => SITE_KEYS,
        }
    }

    /// Tasks that destroy data and ask for confirmation
    pub fn is_destructive(&self) -> bool {
        matches!(self, Task::DropDb | Task::ResetDb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructive_tasks() {
        assert!(Task::DropDb.is_destructive());
        assert!(Task::ResetDb.is_destructive());
        assert!(!Task::CreateDb.is_destructive());
        assert!(!Task::Deploy(DeploymentRequest::new("main")).is_destructive());
    }

    #[test]
    fn deploy_requires_every_remote_path() {
        let keys = Task::Deploy(DeploymentRequest::new("main")).required_keys();
        for key in [
            EnvKey::Hosts,
            EnvKey::User,
            EnvKey::Group,
            EnvKey::SiteDir,
            EnvKey::MaintenanceDir,
            EnvKey::DjangoSettings,
        ] {
            assert!(keys.contains(&key), "{}", key.name());
        }
    }

    #[test]
    fn maintenance_off_does_not_need_group() {
        let keys = Task::Maintenance(MaintenanceState::Off).required_keys();
        assert!(!keys.contains(&EnvKey::Group));
        assert!(Task::Maintenance(MaintenanceState::On)
            .required_keys()
            .contains(&EnvKey::Group));
    }
}
