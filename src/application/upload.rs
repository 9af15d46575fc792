//! Code transfer
//!
//! Mirrors a snapshot into the remote site directory. Remote files that are
//! missing locally and not excluded are deleted.

use crate::config::RunContext;
use crate::domain::ports::{FileTransfer, SyncSpec};
use crate::domain::value_objects::HostTarget;
use crate::error::HoistResult;

use super::snapshot::Snapshot;

/// Sync settings for the code upload
pub fn code_sync_spec(ctx: &RunContext) -> SyncSpec {
    let deploy = &ctx.project.deploy;
    SyncSpec::mirror()
        .with_chmod(deploy.chmod.clone())
        .with_excludes(deploy.excludes.clone())
}

pub fn upload_snapshot(
    transfer: &dyn FileTransfer,
    host: &HostTarget,
    snapshot: &Snapshot,
    ctx: &RunContext,
) -> HoistResult<()> {
    let site_dir = ctx.environment.site_dir()?;
    tracing::info!(
        host = %host,
        site_dir,
        method = transfer.name(),
        "uploading snapshot"
    );
    transfer.push(host, &snapshot.dir, site_dir, &code_sync_spec(ctx))
}
