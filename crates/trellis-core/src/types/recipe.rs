//! Recipes: every known version of a project and its per-version metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Dependency, DependencyGroup, RemoteFile, SourceDescriptor, Version};

/// All known versions of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Human readable name
    pub name: String,
    /// Project homepage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// License identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Version metadata, ascending by version
    #[serde(default)]
    pub versions: BTreeMap<Version, RecipeVersion>,
}

/// Metadata for one version of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeVersion {
    pub source: SourceDescriptor,
    /// Build target to depend on, when not the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyGroup>,
    /// Auxiliary build file fetched alongside the source
    #[serde(rename = "buck", default, skip_serializing_if = "Option::is_none")]
    pub build_file: Option<RemoteFile>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            license: None,
            versions: BTreeMap::new(),
        }
    }

    /// Builder-style helper for adding a version
    pub fn with_version(mut self, version: Version, recipe_version: RecipeVersion) -> Self {
        self.versions.insert(version, recipe_version);
        self
    }

    /// Versions ascending
    pub fn available_versions(&self) -> impl Iterator<Item = &Version> {
        self.versions.keys()
    }
}

impl RecipeVersion {
    /// A version with no dependencies and no build file
    pub fn new(source: SourceDescriptor) -> Self {
        Self {
            source,
            target: None,
            dependencies: None,
            build_file: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: DependencyGroup) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Declared dependencies in resolution order; absent means none
    pub fn dependency_list(&self) -> Vec<Dependency> {
        self.dependencies
            .as_ref()
            .map(DependencyGroup::entries)
            .unwrap_or_default()
    }
}
