//! Progress events emitted while resolving

use std::fmt;

use trellis_core::types::{ProjectId, ResolvedDependencies};

/// A progress notification.
///
/// Events are best-effort: concurrent branches interleave theirs by arrival
/// time, and the terminal result never depends on anyone consuming them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    /// A recipe is about to be fetched
    FetchingRecipe { project: ProjectId },
    /// A recipe arrived; `candidates` versions satisfy the requirement
    RecipeFetched { project: ProjectId, candidates: usize },
    /// Partial state at some point of the search
    Snapshot(ResolvedDependencies),
}

impl ResolutionEvent {
    /// The project this event concerns, if any
    pub fn project(&self) -> Option<&ProjectId> {
        match self {
            ResolutionEvent::FetchingRecipe { project }
            | ResolutionEvent::RecipeFetched { project, .. } => Some(project),
            ResolutionEvent::Snapshot(_) => None,
        }
    }
}

impl fmt::Display for ResolutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionEvent::FetchingRecipe { project } => write!(f, "fetching {}", project),
            ResolutionEvent::RecipeFetched {
                project,
                candidates,
            } => write!(f, "{}: {} candidate version(s)", project, candidates),
            ResolutionEvent::Snapshot(resolved) => {
                write!(f, "{} project(s) resolved", resolved.len())
            }
        }
    }
}
