//! Command implementations and dispatch logic.
//!
//! Every command loads the project through [`load_project`], which applies
//! the configuration layers, then works with the recipe source and strategy
//! the merged configuration describes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};
use trellis_config::{
    ConfigLayering, ConfigLoader, ConfigSource, GlobalConfig, Lockfile, Manifest, StrategyKind, LOCKFILE_NAME,
};
use trellis_core::types::ResolvedDependencies;
use trellis_registry::{CachedRecipeSource, DirectoryRecipeSource, RecipeSource, RetryConfig, RetryingRecipeSource};
use trellis_resolver::{
    LockedResolutionStrategy, NewestResolutionStrategy, OldestResolutionStrategy, ResolutionResult,
    ResolutionStrategy, Resolver,
};

use crate::output::progress::ProgressReporter;
use crate::output::OutputHandler;
use crate::Commands;

pub mod check;
pub mod lock;
pub mod resolve;

#[cfg(test)]
mod tests;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    /// `TRELLIS_*` environment variables
    pub env_overrides: HashMap<String, String>,
    /// Flags from the command line
    pub cli_overrides: HashMap<String, String>,
    pub global_config: Option<GlobalConfig>,
}

/// A loaded project with its configuration layers applied
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest: Manifest,
    /// Directory holding trellis.toml
    pub root: Utf8PathBuf,
}

impl CommandContext {
    /// Create a context for the current directory and process environment
    pub async fn new(cli_overrides: HashMap<String, String>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|path| anyhow::anyhow!("Current directory is not valid UTF-8: {}", path.display()))?;

        let global_config = match ConfigLoader::new(cwd.clone()).load_global_config().await {
            Ok(Some((config, source))) => {
                debug!("Loaded global configuration from {:?}", source);
                Some(config)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring global configuration: {}", e);
                None
            }
        };

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            env_overrides: ConfigLayering::collect_env_overrides(),
            cli_overrides,
            global_config,
        })
    }
}

impl Project {
    pub fn lockfile_path(&self) -> Utf8PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    pub fn recipes_dir(&self) -> Utf8PathBuf {
        self.manifest.recipes_dir(&self.root)
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Resolve { json } => {
            info!("Resolving dependencies");
            resolve::execute(json, ctx).await
        }
        Commands::Lock => {
            info!("Writing lock file");
            lock::execute(ctx).await
        }
        Commands::Check => {
            info!("Checking lock file");
            check::execute(ctx).await
        }
    }
}

/// Find trellis.toml and merge every configuration layer into it
pub async fn load_project(ctx: &CommandContext) -> anyhow::Result<Project> {
    let loader = ConfigLoader::new(ctx.cwd.clone());
    let (manifest, source) = loader
        .load_project_config()
        .await
        .context("Failed to load project configuration")?;

    let root = match &source {
        ConfigSource::Project(path) => path.parent().map(Utf8Path::to_path_buf),
        _ => None,
    }
    .unwrap_or_else(|| ctx.cwd.clone());
    debug!("Project root is {}", root);

    let manifest = ConfigLayering::merge(
        ctx.global_config.clone(),
        manifest,
        ctx.env_overrides.clone(),
        ctx.cli_overrides.clone(),
    )?;

    Ok(Project { manifest, root })
}

/// Recipes from the configured directory, retried and cached
pub fn recipe_source(project: &Project) -> Arc<dyn RecipeSource> {
    let settings = &project.manifest.resolver;

    let directory = DirectoryRecipeSource::new(project.recipes_dir());
    let retrying = RetryingRecipeSource::with_config(
        directory,
        RetryConfig {
            max_retries: settings.max_retries,
            ..RetryConfig::default()
        },
    );
    Arc::new(CachedRecipeSource::with_ttl(
        retrying,
        Duration::from_secs(settings.cache_ttl_secs),
    ))
}

/// Strategy for `kind`; the locked strategy prefers the versions in `lock`
pub fn strategy_for(kind: StrategyKind, lock: Option<&Lockfile>) -> Arc<dyn ResolutionStrategy> {
    match kind {
        StrategyKind::Newest => Arc::new(NewestResolutionStrategy),
        StrategyKind::Oldest => Arc::new(OldestResolutionStrategy),
        StrategyKind::Locked => Arc::new(LockedResolutionStrategy::new(
            lock.map(Lockfile::pinned_versions).unwrap_or_default(),
        )),
    }
}

/// Resolve the project's direct dependencies with its configured strategy
pub async fn resolve_project(project: &Project) -> anyhow::Result<ResolutionResult> {
    let kind = project.manifest.resolver.strategy;
    let lock = match kind {
        StrategyKind::Locked => Lockfile::load(&project.lockfile_path()).await?,
        _ => None,
    };
    if kind == StrategyKind::Locked && lock.is_none() {
        warn!("No {} to prefer; the locked strategy will behave like newest", LOCKFILE_NAME);
    }

    let resolver = Resolver::from_shared(recipe_source(project)).with_shared_strategy(strategy_for(kind, lock.as_ref()));
    let roots = project.manifest.dependency_group()?.entries();

    let mut reporter = ProgressReporter::new();
    let result = resolver
        .resolve_with_events(ResolvedDependencies::new(), roots, |event| reporter.record(&event))
        .await?;
    debug!("Resolution {}", reporter.summary());

    Ok(result)
}
