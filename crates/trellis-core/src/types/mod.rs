//! Core data types for dependency resolution.
//!
//! - Version types for semantic versioning and requirements
//! - Project identity and dependency edges
//! - Recipes and source descriptors
//! - The accumulated resolution state

pub mod dependency;
pub mod project;
pub mod recipe;
pub mod resolved;
pub mod source;
pub mod version;

// Re-export all public types
pub use dependency::{Dependency, DependencyGroup};
pub use project::ProjectId;
pub use recipe::{Recipe, RecipeVersion};
pub use resolved::{ResolvedDependencies, ResolvedEntry};
pub use source::{GitCommit, RemoteArchive, RemoteFile, SourceDescriptor};
pub use version::{Comparator, Op, PartialVersion, Version, VersionError, VersionReq};
