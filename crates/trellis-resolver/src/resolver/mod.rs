//! High level entry point tying a recipe source to a strategy

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future;
use futures::StreamExt;
use tracing::info;
use trellis_core::types::{Dependency, ResolvedDependencies};
use trellis_registry::RecipeSource;

use crate::engine::{self, ResolutionProcess};
use crate::error::ResolutionError;
use crate::event::ResolutionEvent;
use crate::strategy::{NewestResolutionStrategy, ResolutionStrategy};

/// Dependency resolver bound to one recipe source
#[derive(Clone)]
pub struct Resolver {
    /// Where recipes come from
    source: Arc<dyn RecipeSource>,
    /// How competing solutions are ranked
    strategy: Arc<dyn ResolutionStrategy>,
}

/// Result of dependency resolution
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// One version per project reached from the roots
    pub resolved: ResolvedDependencies,
    /// Root dependencies that were requested
    pub roots: Vec<Dependency>,
    /// Total number of projects resolved
    pub package_count: usize,
    /// Resolution time in milliseconds
    pub resolution_time_ms: u64,
}

impl Resolver {
    /// Create a resolver using the default (newest) strategy
    pub fn new<S: RecipeSource + 'static>(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Create a resolver over a source that is shared elsewhere
    pub fn from_shared(source: Arc<dyn RecipeSource>) -> Self {
        Self {
            source,
            strategy: Arc::new(NewestResolutionStrategy),
        }
    }

    /// Replace the ranking strategy
    pub fn with_strategy<T: ResolutionStrategy + 'static>(self, strategy: T) -> Self {
        self.with_shared_strategy(Arc::new(strategy))
    }

    pub fn with_shared_strategy(mut self, strategy: Arc<dyn ResolutionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> &dyn ResolutionStrategy {
        self.strategy.as_ref()
    }

    /// The underlying process, for callers that want to drive events and
    /// outcome themselves
    pub fn process(&self, seed: ResolvedDependencies, dependencies: Vec<Dependency>) -> ResolutionProcess {
        engine::resolve_with(self.source.clone(), seed, dependencies, self.strategy.clone())
    }

    /// Resolve from an empty state
    pub async fn resolve(&self, dependencies: Vec<Dependency>) -> Result<ResolutionResult, ResolutionError> {
        self.resolve_from(ResolvedDependencies::new(), dependencies).await
    }

    /// Resolve with `seed` treated as already decided
    pub async fn resolve_from(
        &self,
        seed: ResolvedDependencies,
        dependencies: Vec<Dependency>,
    ) -> Result<ResolutionResult, ResolutionError> {
        self.resolve_with_events(seed, dependencies, |_| {}).await
    }

    /// Resolve while handing every progress event to `on_event`
    pub async fn resolve_with_events<F>(
        &self,
        seed: ResolvedDependencies,
        dependencies: Vec<Dependency>,
        mut on_event: F,
    ) -> Result<ResolutionResult, ResolutionError>
    where
        F: FnMut(ResolutionEvent),
    {
        let start_time = Instant::now();
        info!(
            "Resolving {} root dependencies with the {} strategy",
            dependencies.len(),
            self.strategy.name()
        );

        let (mut events, outcome) = self.process(seed, dependencies.clone()).run();
        let drain = async {
            while let Some(event) = events.next().await {
                on_event(event);
            }
        };
        let (outcome, ()) = future::join(outcome, drain).await;
        let resolved = outcome?;

        let resolution_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Resolved {} projects in {}ms",
            resolved.len(),
            resolution_time_ms
        );

        Ok(ResolutionResult {
            package_count: resolved.len(),
            resolved,
            roots: dependencies,
            resolution_time_ms,
        })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
