//! The resolution engine
//!
//! [`step`] satisfies one dependency against an accumulated state by
//! fanning out over every candidate version concurrently and keeping the
//! best complete outcome. [`resolve_with`] folds a dependency list through
//! `step`, left to right.
//!
//! Choices are hard commitments: once a project has a version in the state,
//! a later requirement it does not meet fails that branch instead of
//! revisiting the earlier choice.

use std::sync::Arc;

use futures::future;
use futures::stream;
use tracing::{debug, trace};
use trellis_core::types::{Dependency, RecipeVersion, ResolvedDependencies, Version};
use trellis_registry::RecipeSource;

use crate::error::ResolutionError;
use crate::event::ResolutionEvent;
use crate::process::{Continuation, Process};
use crate::strategy::{NewestResolutionStrategy, ResolutionStrategy, Score};

/// Stack size for threads that drive deep resolutions.
///
/// Every dependency level nests one more future inside the one polling it,
/// so stack use grows with the depth of the graph. A default 2 MiB thread
/// copes with chains a few hundred projects deep; this size covers chains
/// of several thousand.
pub const RESOLUTION_STACK_SIZE: usize = 64 * 1024 * 1024;

/// A running resolution: progress events plus the final state
pub type ResolutionProcess = Process<ResolutionEvent, ResolvedDependencies, ResolutionError>;

type Candidate = (Version, RecipeVersion);

/// Resolve `next` against `resolved`.
pub fn step(
    source: Arc<dyn RecipeSource>,
    resolved: ResolvedDependencies,
    next: Dependency,
    strategy: Arc<dyn ResolutionStrategy>,
) -> ResolutionProcess {
    if let Some(version) = resolved.version_of(&next.project).cloned() {
        return already_resolved(resolved, next, version);
    }

    let branch_source = source.clone();
    let branch_strategy = strategy.clone();
    let base = resolved;
    let dependency = next.clone();

    fetch_candidates(source, next.clone())
        .chain(move |candidates| {
            let branches: Vec<_> = candidates
                .into_iter()
                .map(|(version, recipe_version)| {
                    let dependencies = recipe_version.dependency_list();
                    let extended = base.add(dependency.project.clone(), version.clone(), recipe_version);
                    let project = dependency.project.clone();

                    resolve_with(branch_source.clone(), extended, dependencies, branch_strategy.clone())
                        .map(Some)
                        .on_error_return(move |error| {
                            trace!("Candidate {}@{} rejected: {}", project, version, error);
                            None
                        })
                })
                .collect();
            Process::merge(branches)
        })
        .chain(move |outcomes| {
            let viable = outcomes.into_iter().filter_map(|outcome| outcome.ok().flatten());
            match select_best(strategy.as_ref(), viable) {
                Some(best) => {
                    trace!("Selected {} for {}", best, next);
                    emit_and_succeed(best)
                }
                None => Process::fail(ResolutionError::Unsatisfiable { dependency: next }),
            }
        })
}

/// Fold `dependencies` through [`step`], starting from `resolved`.
///
/// The returned future is polled recursively, one frame group per level of
/// the dependency graph. Drive graphs deeper than a few hundred levels from
/// a thread with [`RESOLUTION_STACK_SIZE`] of stack.
pub fn resolve_with(
    source: Arc<dyn RecipeSource>,
    resolved: ResolvedDependencies,
    dependencies: Vec<Dependency>,
    strategy: Arc<dyn ResolutionStrategy>,
) -> ResolutionProcess {
    let steps: Vec<Continuation<ResolutionEvent, ResolvedDependencies, ResolutionError>> = dependencies
        .into_iter()
        .map(|dependency| {
            let source = source.clone();
            let strategy = strategy.clone();
            Box::new(move |resolved| step(source, resolved, dependency, strategy)) as Continuation<_, _, _>
        })
        .collect();

    Process::chain_n(Process::just(resolved), steps)
}

/// Resolve `dependencies` from an empty state with the default strategy
pub fn resolve(source: Arc<dyn RecipeSource>, dependencies: Vec<Dependency>) -> ResolutionProcess {
    resolve_with(
        source,
        ResolvedDependencies::new(),
        dependencies,
        Arc::new(NewestResolutionStrategy),
    )
}

/// The project is already fixed: keep the state if the version fits
fn already_resolved(resolved: ResolvedDependencies, next: Dependency, version: Version) -> ResolutionProcess {
    let outcome = if next.requirement.matches(&version) {
        Ok(resolved.clone())
    } else {
        Err(ResolutionError::Conflict {
            project: next.project,
            version,
            requirement: next.requirement,
        })
    };

    Process::of(
        stream::once(future::ready(ResolutionEvent::Snapshot(resolved))),
        future::ready(outcome),
    )
}

/// Fetch the recipe of `dependency.project` and keep the versions its
/// requirement accepts, ascending
fn fetch_candidates(
    source: Arc<dyn RecipeSource>,
    dependency: Dependency,
) -> Process<ResolutionEvent, Vec<Candidate>, ResolutionError> {
    Process::new(move |sink| async move {
        let project = dependency.project;
        debug!("Fetching recipe for {}", project);
        sink.emit(ResolutionEvent::FetchingRecipe {
            project: project.clone(),
        });

        let recipe = source.fetch(&project).await?;
        let available = recipe.versions.len();

        // BTreeMap iteration is ascending by version
        let candidates: Vec<Candidate> = recipe
            .versions
            .into_iter()
            .filter(|(version, _)| dependency.requirement.matches(version))
            .collect();

        debug!(
            "{} of {} versions of {} satisfy {}",
            candidates.len(),
            available,
            project,
            dependency.requirement
        );
        sink.emit(ResolutionEvent::RecipeFetched {
            project,
            candidates: candidates.len(),
        });
        Ok::<_, ResolutionError>(candidates)
    })
}

fn emit_and_succeed(resolved: ResolvedDependencies) -> ResolutionProcess {
    Process::of(
        stream::once(future::ready(ResolutionEvent::Snapshot(resolved.clone()))),
        future::ready(Ok(resolved)),
    )
}

/// Highest score wins; on equal scores the earliest outcome is kept
pub fn select_best<I>(strategy: &dyn ResolutionStrategy, outcomes: I) -> Option<ResolvedDependencies>
where
    I: IntoIterator<Item = ResolvedDependencies>,
{
    let mut best: Option<(Score, ResolvedDependencies)> = None;
    for outcome in outcomes {
        let score = strategy.score(&outcome);
        let better = match &best {
            Some((best_score, _)) => score > *best_score,
            None => true,
        };
        if better {
            best = Some((score, outcome));
        }
    }
    best.map(|(_, resolved)| resolved)
}
