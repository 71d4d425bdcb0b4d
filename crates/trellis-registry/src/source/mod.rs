//! The recipe source boundary and the in-memory source

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use trellis_core::error::TrellisError;
use trellis_core::types::{ProjectId, Recipe};

use crate::RegistryResult;

/// Produces the recipe of a project.
///
/// Implementations must be safe to call concurrently and repeatedly for the
/// same project; the resolver does no caching of its own.
pub trait RecipeSource: Send + Sync {
    /// Fetch every known version of `project`
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>>;
}

impl<S: RecipeSource + ?Sized> RecipeSource for Arc<S> {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        (**self).fetch(project)
    }
}

impl<S: RecipeSource + ?Sized> RecipeSource for Box<S> {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        (**self).fetch(project)
    }
}

/// Recipes held in memory, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryRecipeSource {
    recipes: DashMap<ProjectId, Recipe>,
    /// Number of fetches served per project
    fetches: DashMap<ProjectId, usize>,
    /// Simulated latency applied to every fetch
    latency: Option<Duration>,
}

impl MemoryRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register (or replace) the recipe of a project
    pub fn insert(&self, project: ProjectId, recipe: Recipe) {
        self.recipes.insert(project, recipe);
    }

    /// Builder-style variant of [`MemoryRecipeSource::insert`]
    pub fn with_recipe(self, project: ProjectId, recipe: Recipe) -> Self {
        self.insert(project, recipe);
        self
    }

    /// How many times `project` has been fetched, including failed lookups
    pub fn fetch_count(&self, project: &ProjectId) -> usize {
        self.fetches.get(project).map(|count| *count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeSource for MemoryRecipeSource {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        async move {
            *self.fetches.entry(project.clone()).or_insert(0) += 1;

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            self.recipes
                .get(project)
                .map(|recipe| recipe.clone())
                .ok_or_else(|| TrellisError::RecipeNotFound {
                    project: project.to_string(),
                })
        }
        .boxed()
    }
}
