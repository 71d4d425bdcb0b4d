//! Terminal failures of a resolution

use thiserror::Error;
use trellis_core::error::TrellisError;
use trellis_core::types::{Dependency, ProjectId, Version, VersionReq};

/// Why a resolution (or one branch of it) failed
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A project already fixed to `version` is required again by a
    /// requirement that version does not satisfy
    #[error("{project}@{version} does not satisfy {project}@{requirement}")]
    Conflict {
        project: ProjectId,
        version: Version,
        requirement: VersionReq,
    },

    /// No candidate version, or none of their sub-resolutions, worked out
    #[error("Could not satisfy {dependency}")]
    Unsatisfiable { dependency: Dependency },

    /// The recipe source could not produce a recipe
    #[error(transparent)]
    Fetch(#[from] TrellisError),
}

impl ResolutionError {
    /// The project at fault, when the error names one
    pub fn project(&self) -> Option<&ProjectId> {
        match self {
            ResolutionError::Conflict { project, .. } => Some(project),
            ResolutionError::Unsatisfiable { dependency } => Some(&dependency.project),
            ResolutionError::Fetch(_) => None,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ResolutionError::Conflict { .. } => {
                Some("Two requirements on the same project cannot both hold; relax one of them")
            }
            ResolutionError::Unsatisfiable { .. } => {
                Some("Check which versions the recipe offers for this project")
            }
            ResolutionError::Fetch(error) => error.suggestion(),
        }
    }
}
