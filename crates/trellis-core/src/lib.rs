//! # trellis-core
//!
//! Core types shared across all trellis crates.
//!
//! This crate provides:
//! - `Version` and `VersionReq`, the ordered version type and its predicate
//! - `ProjectId`, `Dependency`, `DependencyGroup`, `Recipe` and `RecipeVersion`
//! - `ResolvedDependencies`, the persistent accumulated resolution state
//! - `TrellisError` for unified error handling
//!
//! ## Architecture
//!
//! - `types`: Core data types
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{TrellisError, TrellisResult};
pub use types::{
    Dependency, DependencyGroup, GitCommit, ProjectId, Recipe, RecipeVersion, RemoteArchive,
    RemoteFile, ResolvedDependencies, ResolvedEntry, SourceDescriptor, Version, VersionReq,
};
