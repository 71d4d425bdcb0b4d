//! Recipe sources for trellis
//!
//! The resolver treats a [`RecipeSource`] as its only I/O boundary. This
//! crate defines that trait and a set of composable sources: an in-memory
//! source, a directory of JSON recipes, and wrappers adding a TTL cache and
//! retry with exponential backoff.

pub mod cache;
pub mod directory;
pub mod retry;
pub mod source;

// Re-export main types
pub use cache::{CacheEntry, CacheStats, CachedRecipeSource};
pub use directory::DirectoryRecipeSource;
pub use retry::{RetryConfig, RetryingRecipeSource};
pub use source::{MemoryRecipeSource, RecipeSource};

use trellis_core::error::TrellisError;

/// Result type for recipe source operations
pub type RegistryResult<T> = Result<T, TrellisError>;
