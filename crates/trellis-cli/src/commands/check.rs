//! `trellis check` command implementation.
//!
//! Verifies, without resolving, that the lock file still covers every
//! direct dependency in trellis.toml and that every reference inside the
//! lock points at a locked project.

use trellis_config::{Lockfile, LOCKFILE_NAME};

use super::{load_project, CommandContext};

/// Execute the `trellis check` command
pub async fn execute(ctx: &CommandContext) -> anyhow::Result<()> {
    let project = load_project(ctx).await?;
    let dependencies = project.manifest.dependency_group()?;

    let lock = Lockfile::load(&project.lockfile_path())
        .await?
        .ok_or_else(|| anyhow::anyhow!("No {} found; run 'trellis lock' first", LOCKFILE_NAME))?;

    let unsatisfied = lock.unsatisfied(&dependencies);
    for dependency in &unsatisfied {
        match lock.get(&dependency.project) {
            Some(package) => ctx.output.error(&format!(
                "{} is locked at {} which does not satisfy {}",
                dependency.project, package.version, dependency.requirement
            )),
            None => ctx.output.error(&format!("{} is not locked", dependency)),
        }
    }

    let dangling = lock.dangling_references();
    for (from, to) in &dangling {
        ctx.output
            .error(&format!("{} depends on {} which is not locked", from, to));
    }

    if !unsatisfied.is_empty() || !dangling.is_empty() {
        anyhow::bail!(
            "{} is out of date with trellis.toml; run 'trellis lock'",
            LOCKFILE_NAME
        );
    }

    ctx.output.success(&format!(
        "{} satisfies all {} direct dependencies",
        LOCKFILE_NAME,
        dependencies.len()
    ));
    Ok(())
}
