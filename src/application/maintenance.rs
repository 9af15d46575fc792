//! Maintenance toggle
//!
//! `on` mirrors the local maintenance page into the remote maintenance
//! directory and hands it to the web group; `off` empties that directory.
//! Neither transition is atomic.

use crate::config::{EnvKey, RunContext};
use crate::domain::ports::{FileTransfer, RemoteShell, SyncSpec};
use crate::domain::value_objects::{quote, HostTarget, MaintenanceState, RemoteCommand};
use crate::error::HoistResult;

use super::session::RemoteSession;

pub struct MaintenanceToggle<'a> {
    shell: &'a dyn RemoteShell,
    transfer: &'a dyn FileTransfer,
    ctx: &'a RunContext,
}

impl<'a> MaintenanceToggle<'a> {
    pub fn new(shell: &'a dyn RemoteShell, transfer: &'a dyn FileTransfer, ctx: &'a RunContext) -> Self {
        Self {
            shell,
            transfer,
            ctx,
        }
    }

    /// Environment keys needed to switch into `state`
    pub fn required_keys(state: MaintenanceState) -> &'static [EnvKey] {
        match state {
            MaintenanceState::On => &[EnvKey::Hosts, EnvKey::MaintenanceDir, EnvKey::Group],
            MaintenanceState::Off => &[EnvKey::Hosts, EnvKey::MaintenanceDir],
        }
    }

    pub fn apply(&self, host: &HostTarget, state: MaintenanceState) -> HoistResult<()> {
        let env = &self.ctx.environment;
        env.require(Self::required_keys(state))?;
        let dir = env.maintenance_dir()?;

        tracing::info!(host = %host, state = %state, "switching maintenance mode");

        match state {
            MaintenanceState::On => {
                let deploy = &self.ctx.project.deploy;
                let spec = SyncSpec::mirror().with_chmod(deploy.chmod.clone());
                self.transfer
                    .push(host, &deploy.maintenance_source, dir, &spec)?;

                let session = RemoteSession::open(self.shell, host, dir);
                session.run(&RemoteCommand::new(format!(
                    "chgrp -R {} .",
                    quote(env.group()?)
                )))?;
            }
            MaintenanceState::Off => {
                let session = RemoteSession::open(self.shell, host, dir);
                session.run(&RemoteCommand::new("rm -rf ./*"))?;
            }
        }

        Ok(())
    }
}
