//! Deploy phases and provisioning steps
//!
//! Both enums derive `Ord` in execution order; the deploy use case walks them in
//! that order and nothing else reorders them.

use std::fmt;

/// Top-level phase of a deploy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeployPhase {
    Snapshot,
    MaintenanceOn,
    Upload,
    Provision,
    MaintenanceOff,
    Cleanup,
}

impl DeployPhase {
    /// Machine-readable name (JSON events)
    pub fn name(&self) -> &'static str {
        match self {
            DeployPhase::Snapshot => "snapshot",
            DeployPhase::MaintenanceOn => "maintenance_on",
            DeployPhase::Upload => "upload",
            DeployPhase::Provision => "provision",
            DeployPhase::MaintenanceOff => "maintenance_off",
            DeployPhase::Cleanup => "cleanup",
        }
    }

    /// Operator-facing description
    pub fn label(&self) -> &'static str {
        match self {
            DeployPhase::Snapshot => "Creating git archive",
            DeployPhase::MaintenanceOn => "Enabling maintenance mode",
            DeployPhase::Upload => "Uploading code to server",
            DeployPhase::Provision => "Running deployment tasks",
            DeployPhase::MaintenanceOff => "Disabling maintenance mode",
            DeployPhase::Cleanup => "Cleaning up",
        }
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of the provisioning pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProvisionStep {
    InstallRequirements,
    Migrate,
    BowerInstall,
    CollectStatic,
    Permissions,
    ReloadWebserver,
    RestartWorkers,
    RegisterDeployment,
}

impl ProvisionStep {
    /// Every step, in execution order
    pub const ALL: [ProvisionStep; 8] = [
        ProvisionStep::InstallRequirements,
        ProvisionStep::Migrate,
        ProvisionStep::BowerInstall,
        ProvisionStep::CollectStatic,
        ProvisionStep::Permissions,
        ProvisionStep::ReloadWebserver,
        ProvisionStep::RestartWorkers,
        ProvisionStep::RegisterDeployment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::InstallRequirements => "install_requirements",
            ProvisionStep::Migrate => "migrate",
            ProvisionStep::BowerInstall => "bower_install",
            ProvisionStep::CollectStatic => "collectstatic",
            ProvisionStep::Permissions => "permissions",
            ProvisionStep::ReloadWebserver => "reload_webserver",
            ProvisionStep::RestartWorkers => "restart_workers",
            ProvisionStep::RegisterDeployment => "register_deployment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProvisionStep::InstallRequirements => "Installing Python requirements with pip",
            ProvisionStep::Migrate => "Migrating database",
            ProvisionStep::BowerInstall => "Installing bower components",
            ProvisionStep::CollectStatic => "Collecting static files",
            ProvisionStep::Permissions => "Setting file permissions",
            ProvisionStep::ReloadWebserver => "Restarting webserver",
            ProvisionStep::RestartWorkers => "Restarting celery workers",
            ProvisionStep::RegisterDeployment => "Registering deployment",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_steps_are_sorted() {
        let mut sorted = ProvisionStep::ALL;
        sorted.sort();
        assert_eq!(sorted, ProvisionStep::ALL);
    }

    #[test]
    fn requirements_precede_registration() {
        assert!(ProvisionStep::InstallRequirements < ProvisionStep::Migrate);
        assert!(ProvisionStep::Migrate < ProvisionStep::CollectStatic);
        assert!(ProvisionStep::CollectStatic < ProvisionStep::Permissions);
        assert!(ProvisionStep::Permissions < ProvisionStep::ReloadWebserver);
        assert!(ProvisionStep::RestartWorkers < ProvisionStep::RegisterDeployment);
    }

    #[test]
    fn maintenance_brackets_upload_and_provision() {
        assert!(DeployPhase::MaintenanceOn < DeployPhase::Upload);
        assert!(DeployPhase::Provision < DeployPhase::MaintenanceOff);
        assert_eq!(DeployPhase::MaintenanceOff.name(), "maintenance_off");
    }
}
