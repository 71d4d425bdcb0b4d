//! Recipes stored as JSON files on disk
//!
//! Layout: `<root>/<namespace>/<name>.json`, one [`Recipe`] per file.

use camino::{Utf8Path, Utf8PathBuf};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;
use trellis_core::error::TrellisError;
use trellis_core::types::{ProjectId, Recipe};

use crate::source::RecipeSource;
use crate::RegistryResult;

/// Reads recipes from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryRecipeSource {
    root: Utf8PathBuf,
}

impl DirectoryRecipeSource {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// File holding the recipe of `project`
    pub fn recipe_path(&self, project: &ProjectId) -> Utf8PathBuf {
        self.root
            .join(&project.namespace)
            .join(format!("{}.json", project.name))
    }
}

impl RecipeSource for DirectoryRecipeSource {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        async move {
            let path = self.recipe_path(project);
            debug!("Reading recipe for {} from {}", project, path);

            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(TrellisError::RecipeNotFound {
                        project: project.to_string(),
                    });
                }
                Err(e) => {
                    return Err(TrellisError::io(format!("Failed to read {}", path), e));
                }
            };

            serde_json::from_str(&contents).map_err(|e| TrellisError::RecipeParse {
                project: project.to_string(),
                message: e.to_string(),
            })
        }
        .boxed()
    }
}
