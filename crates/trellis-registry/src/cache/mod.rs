//! Recipe caching with TTL support
//!
//! Sibling branches of a resolution fetch the same projects independently.
//! Wrapping the source in a [`CachedRecipeSource`] collapses those repeat
//! fetches without changing what the resolver computes.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::trace;
use trellis_core::types::{ProjectId, Recipe};

use crate::source::RecipeSource;
use crate::RegistryResult;

/// Default time-to-live for cached recipes (1 hour)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached recipe
    pub recipe: Recipe,
    /// When the entry was stored
    pub stored_at: Instant,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create new cache entry with the default TTL
    pub fn new(recipe: Recipe) -> Self {
        Self::with_ttl(recipe, DEFAULT_TTL)
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(recipe: Recipe, ttl: Duration) -> Self {
        Self {
            recipe,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        self.age() < self.ttl
    }

    /// Get age of cache entry
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

/// Recipe source wrapper that memoizes successful fetches per project
#[derive(Debug)]
pub struct CachedRecipeSource<S> {
    inner: S,
    cache: DashMap<ProjectId, CacheEntry>,
    ttl: Duration,
}

impl<S: RecipeSource> CachedRecipeSource<S> {
    /// Wrap `inner` with the default TTL
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            ttl,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cached recipe if fresh
    pub fn get(&self, project: &ProjectId) -> Option<Recipe> {
        let fresh = {
            let entry = self.cache.get(project)?;
            entry.is_fresh().then(|| entry.recipe.clone())
        };
        if fresh.is_none() {
            self.cache.remove(project);
        }
        fresh
    }

    /// Store a recipe with the configured TTL
    pub fn insert(&self, project: ProjectId, recipe: Recipe) {
        self.cache
            .insert(project, CacheEntry::with_ttl(recipe, self.ttl));
    }

    /// Check if project is cached and fresh
    pub fn contains_fresh(&self, project: &ProjectId) -> bool {
        self.cache
            .get(project)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let fresh_entries = self.cache.iter().filter(|entry| entry.is_fresh()).count();
        let total_entries = self.cache.len();

        CacheStats {
            total_entries,
            fresh_entries,
            stale_entries: total_entries - fresh_entries,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, entry| entry.is_fresh());
        before - self.cache.len()
    }
}

impl<S: RecipeSource> RecipeSource for CachedRecipeSource<S> {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        async move {
            if let Some(recipe) = self.get(project) {
                trace!("Recipe cache hit for {}", project);
                return Ok(recipe);
            }

            // Failures are not cached; the next fetch asks the inner source again
            let recipe = self.inner.fetch(project).await?;
            self.insert(project.clone(), recipe.clone());
            Ok(recipe)
        }
        .boxed()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
}
