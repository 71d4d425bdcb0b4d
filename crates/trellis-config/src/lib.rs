//! Configuration parsing for trellis
//!
//! This crate handles the `trellis.toml` project manifest, layering of
//! configuration from global, environment and command line sources, and the
//! `trellis.lock.json` lock file whose entries use the resolved-dependency
//! record format.

pub mod lock;
pub mod manifest;
pub mod merge;

// Re-export main types
pub use lock::{LockedPackage, Lockfile, ResolvedDependency, ResolvedDependencyReference, LOCKFILE_NAME};
pub use manifest::{Manifest, PackageSection, ResolverSection, StrategyKind, MANIFEST_NAME};
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, GlobalConfig, ResolverDefaults};

use trellis_core::error::TrellisError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, TrellisError>;
