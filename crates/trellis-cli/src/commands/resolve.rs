//! `trellis resolve` command implementation.
//!
//! Resolves the manifest's dependencies and prints one `project version`
//! line per resolved project, or the same mapping as JSON.

use anyhow::Context;

use super::{load_project, resolve_project, CommandContext};

/// Execute the `trellis resolve` command
pub async fn execute(json: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let project = load_project(ctx).await?;
    let result = resolve_project(&project).await?;

    if json {
        let mapping = serde_json::to_string_pretty(&result.resolved.versions())
            .context("Failed to serialize resolved versions")?;
        ctx.output.print(&mapping);
    } else {
        for (id, entry) in result.resolved.iter() {
            ctx.output
                .print(&ctx.output.format_pin(&id.to_string(), &entry.version.to_string()));
        }
        ctx.output.success(&format!(
            "Resolved {} projects in {}ms",
            result.package_count, result.resolution_time_ms
        ));
    }

    Ok(())
}
