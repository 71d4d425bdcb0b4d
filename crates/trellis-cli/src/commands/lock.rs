//! `trellis lock` command implementation.

use tracing::debug;
use trellis_config::{Lockfile, LOCKFILE_NAME};

use super::{load_project, resolve_project, CommandContext};

/// Execute the `trellis lock` command
pub async fn execute(ctx: &CommandContext) -> anyhow::Result<()> {
    let project = load_project(ctx).await?;
    let result = resolve_project(&project).await?;

    let lock = Lockfile::from_resolved(&result.resolved);
    let path = project.lockfile_path();
    lock.save(&path).await?;
    debug!("Wrote {}", path);

    ctx.output
        .success(&format!("Locked {} projects to {}", lock.len(), LOCKFILE_NAME));
    Ok(())
}
