//! Error types and result aliases for trellis operations.
//!
//! Resolution failures (conflicts, unsatisfiable requirements) live in the
//! resolver crate; this type covers everything around them: identifiers,
//! recipe sources, configuration and I/O.

use thiserror::Error;

use crate::types::VersionError;

/// Unified error type for trellis operations
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("Invalid project identifier '{input}': {reason}")]
    InvalidProjectId { input: String, reason: String },

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    // Recipe source errors
    #[error("No recipe found for project '{project}'")]
    RecipeNotFound { project: String },

    #[error("Failed to fetch recipe: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse recipe for '{project}': {message}")]
    RecipeParse { project: String, message: String },

    // Record format errors
    #[error("Missing required field `{field}`")]
    MissingField { field: String },

    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Failed to parse trellis.toml: {message}")]
    TomlParse { message: String },

    #[error("Failed to parse {what}: {message}")]
    JsonParse { what: String, message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for trellis operations
pub type TrellisResult<T> = Result<T, TrellisError>;

impl TrellisError {
    /// Create a fetch error from any error type
    pub fn fetch<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrellisError::Fetch { .. } | TrellisError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TrellisError::InvalidProjectId { .. } => {
                Some("Project identifiers look like 'namespace/name'")
            }
            TrellisError::RecipeNotFound { .. } => {
                Some("Check the project name or point --recipes at the right directory")
            }
            TrellisError::Fetch { .. } => Some("Check the recipe source and try again"),
            TrellisError::MissingField { .. } => {
                Some("The lock file may be corrupt; regenerate it with 'trellis lock'")
            }
            TrellisError::ConfigValidation { .. } | TrellisError::TomlParse { .. } => {
                Some("Fix trellis.toml and run 'trellis check'")
            }
            _ => None,
        }
    }
}
