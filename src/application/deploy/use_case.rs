//! Deploy Use Case
//!
//! Orchestrates the deployment flow:
//! 1. Build the snapshot once, locally
//! 2. Per host, in order: maintenance on, upload, provision, maintenance off
//! 3. Remove the snapshot
//!
//! The first error aborts the run. Nothing is rolled back: maintenance stays on
//! for the failing host and the snapshot is kept for inspection. Remote sessions
//! are still released because they are scoped guards.

use crate::application::maintenance::MaintenanceToggle;
use crate::application::provision::{open_site_session, Provisioner};
use crate::application::snapshot::{remove_snapshot, Snapshot, SnapshotBuilder};
use crate::application::upload::upload_snapshot;
use crate::config::{EnvKey, RunContext};
use crate::domain::ports::{
    DeployEvent, DeployEventSink, FileTransfer, RemoteShell, VersionControl,
};
use crate::domain::value_objects::{
    DeployPhase, DeploymentRequest, HostTarget, MaintenanceState,
};
use crate::error::HoistResult;

use super::result::{DeployResult, HostReport};

/// Keys a deploy needs; checked before anything is touched
pub const DEPLOY_KEYS: &[EnvKey] = &[
    EnvKey::Hosts,
    EnvKey::User,
    EnvKey::Group,
    EnvKey::SiteDir,
    EnvKey::MaintenanceDir,
    EnvKey::DjangoSettings,
];

/// Deploy use case - orchestrates the deployment flow
///
/// Parameterized by its ports so tests can record every remote call.
pub struct DeployUseCase<S, T, V>
where
    S: RemoteShell,
    T: FileTransfer,
    V: VersionControl,
{
    shell: S,
    transfer: T,
    vcs: V,
}

impl<S, T, V> DeployUseCase<S, T, V>
where
    S: RemoteShell,
    T: FileTransfer,
    V: VersionControl,
{
    pub fn new(shell: S, transfer: T, vcs: V) -> Self {
        Self {
            shell,
            transfer,
            vcs,
        }
    }

    /// Execute the deploy use case
    pub fn execute(
        &self,
        ctx: &RunContext,
        request: &DeploymentRequest,
        events: &dyn DeployEventSink,
    ) -> HoistResult<DeployResult> {
        let env = &ctx.environment;
        env.require(DEPLOY_KEYS)?;
        let hosts = env.hosts()?;

        events.on_event(DeployEvent::Started {
            git_ref: request.git_ref.clone(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
        });
        tracing::info!(
            git_ref = %request.git_ref,
            environment = env.name(),
            hosts = hosts.len(),
            upgrade = request.upgrade,
            "deploy started"
        );

        let snapshot = self.build_snapshot(ctx, request, events)?;

        let mut reports = Vec::with_capacity(hosts.len());
        for host in hosts {
            reports.push(self.deploy_host(ctx, host, &snapshot, request.upgrade, events)?);
        }

        events.on_event(DeployEvent::PhaseStarted {
            phase: DeployPhase::Cleanup,
            host: None,
        });
        remove_snapshot(&snapshot)?;
        events.on_event(DeployEvent::PhaseCompleted {
            phase: DeployPhase::Cleanup,
            host: None,
        });

        let result = DeployResult {
            git_ref: request.git_ref.clone(),
            revision: snapshot.revision,
            snapshot_dir: snapshot.dir,
            file_count: snapshot.file_count,
            hosts: reports,
        };

        events.on_event(DeployEvent::Completed {
            git_ref: result.git_ref.clone(),
            commit: result.revision.commit.clone(),
            hosts: result.host_names(),
        });
        tracing::info!(commit = %result.revision.commit, "deploy finished");

        Ok(result)
    }

    fn build_snapshot(
        &self,
        ctx: &RunContext,
        request: &DeploymentRequest,
        events: &dyn DeployEventSink,
    ) -> HoistResult<Snapshot> {
        events.on_event(DeployEvent::PhaseStarted {
            phase: DeployPhase::Snapshot,
            host: None,
        });

        let root = ctx.project.deploy.snapshot_root();
        let builder = SnapshotBuilder::new(&self.vcs, &root, &ctx.project.project.source_subtree);
        let revision = builder.resolve(&request.git_ref)?;
        events.on_event(DeployEvent::Resolved {
            commit: revision.commit.clone(),
            branch: revision.branch.clone(),
            snapshot: revision.snapshot_dir(&root),
        });
        let snapshot = builder.materialize(revision)?;

        events.on_event(DeployEvent::PhaseCompleted {
            phase: DeployPhase::Snapshot,
            host: None,
        });
        Ok(snapshot)
    }

    fn deploy_host(
        &self,
        ctx: &RunContext,
        host: &HostTarget,
        snapshot: &Snapshot,
        upgrade: bool,
        events: &dyn DeployEventSink,
    ) -> HoistResult<HostReport> {
        let name = host.to_string();
        let toggle = MaintenanceToggle::new(&self.shell, &self.transfer, ctx);

        run_phase(events, DeployPhase::MaintenanceOn, &name, || {
            toggle.apply(host, MaintenanceState::On)
        })?;

        run_phase(events, DeployPhase::Upload, &name, || {
            upload_snapshot(&self.transfer, host, snapshot, ctx)
        })?;

        let steps = run_phase(events, DeployPhase::Provision, &name, || {
            let session = open_site_session(&self.shell, host, ctx)?;
            Provisioner::new(ctx, events).run(&session, &snapshot.revision, upgrade)
        })?;

        run_phase(events, DeployPhase::MaintenanceOff, &name, || {
            toggle.apply(host, MaintenanceState::Off)
        })?;

        Ok(HostReport { host: name, steps })
    }
}

/// Bracket `f` with phase events; no completion event on error
fn run_phase<R>(
    events: &dyn DeployEventSink,
    phase: DeployPhase,
    host: &str,
    f: impl FnOnce() -> HoistResult<R>,
) -> HoistResult<R> {
    events.on_event(DeployEvent::PhaseStarted {
        phase,
        host: Some(host.to_string()),
    });
    tracing::info!(host, phase = %phase, "{}", phase.label());

    let value = f().inspect_err(|err| {
        tracing::error!(host, phase = %phase, error = %err, "phase failed");
    })?;

    events.on_event(DeployEvent::PhaseCompleted {
        phase,
        host: Some(host.to_string()),
    });
    Ok(value)
}
