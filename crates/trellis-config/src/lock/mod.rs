//! trellis.lock.json and the resolved-dependency record format
//!
//! Each locked project is one JSON object: its chosen `version` plus the
//! resolved-dependency record for that version:
//!
//! ```json
//! {
//!   "version": "1.2.11",
//!   "source": "https://github.com/madler/zlib.git#cacf7f1",
//!   "target": "//:zlib",
//!   "dependencies": [{ "project": "acme/cmake-shim" }],
//!   "buck": { "url": "https://example.com/BUCK", "sha256": "aa" }
//! }
//! ```
//!
//! `source` is required and is either a `<url>#<commit>` string or a remote
//! archive object. Every other key is optional, and a key that was present
//! when parsing is written back, even an empty `dependencies` list.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use trellis_core::error::TrellisError;
use trellis_core::types::{
    Dependency, DependencyGroup, ProjectId, RecipeVersion, RemoteFile, ResolvedDependencies, SourceDescriptor,
    Version,
};

use crate::ConfigResult;

/// File name of the lock file, written next to trellis.toml
pub const LOCKFILE_NAME: &str = "trellis.lock.json";

/// Resolved projects keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub packages: BTreeMap<ProjectId, LockedPackage>,
}

/// One locked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub version: Version,
    #[serde(flatten)]
    pub resolved: ResolvedDependency,
}

/// Everything needed to fetch and build one resolved project version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub source: SourceDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<ResolvedDependencyReference>>,
    #[serde(rename = "buck", skip_serializing_if = "Option::is_none")]
    pub build_file: Option<RemoteFile>,
}

/// Edge from a resolved project to another resolved project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedDependencyReference {
    pub project: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Wire shape before `source` is known to be present
#[derive(Deserialize)]
struct RawResolvedDependency {
    #[serde(default)]
    source: Option<SourceDescriptor>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    dependencies: Option<Vec<ResolvedDependencyReference>>,
    #[serde(default, rename = "buck")]
    build_file: Option<RemoteFile>,
}

impl TryFrom<RawResolvedDependency> for ResolvedDependency {
    type Error = TrellisError;

    fn try_from(raw: RawResolvedDependency) -> Result<Self, Self::Error> {
        let source = raw.source.ok_or_else(|| TrellisError::MissingField {
            field: "source".to_string(),
        })?;
        Ok(Self {
            source,
            target: raw.target,
            dependencies: raw.dependencies,
            build_file: raw.build_file,
        })
    }
}

impl<'de> Deserialize<'de> for ResolvedDependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawResolvedDependency::deserialize(deserializer)?;
        ResolvedDependency::try_from(raw).map_err(|_| de::Error::missing_field("source"))
    }
}

impl ResolvedDependency {
    /// A record with only a source
    pub fn new(source: SourceDescriptor) -> Self {
        Self {
            source,
            target: None,
            dependencies: None,
            build_file: None,
        }
    }

    /// Dependency references, empty when the record lists none
    pub fn references(&self) -> &[ResolvedDependencyReference] {
        self.dependencies.as_deref().unwrap_or_default()
    }

    /// Parse a single record.
    ///
    /// A record without `source` fails with [`TrellisError::MissingField`]
    /// rather than a generic parse error.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let raw: RawResolvedDependency = serde_json::from_str(content).map_err(|e| TrellisError::JsonParse {
            what: "resolved dependency".to_string(),
            message: e.to_string(),
        })?;
        Self::try_from(raw)
    }

    /// Record for `recipe_version`, with references resolved against `resolved`
    pub fn from_recipe_version(recipe_version: &RecipeVersion, resolved: &ResolvedDependencies) -> Self {
        let dependencies = recipe_version.dependencies.as_ref().map(|group| {
            group
                .entries()
                .into_iter()
                .map(|dependency| ResolvedDependencyReference {
                    target: resolved
                        .get(&dependency.project)
                        .and_then(|entry| entry.recipe_version.target.clone()),
                    project: dependency.project,
                })
                .collect()
        });

        Self {
            source: recipe_version.source.clone(),
            target: recipe_version.target.clone(),
            dependencies,
            build_file: recipe_version.build_file.clone(),
        }
    }
}

impl Lockfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every project in a resolution result
    pub fn from_resolved(resolved: &ResolvedDependencies) -> Self {
        let packages = resolved
            .iter()
            .map(|(project, entry)| {
                let package = LockedPackage {
                    version: entry.version.clone(),
                    resolved: ResolvedDependency::from_recipe_version(&entry.recipe_version, resolved),
                };
                (project.clone(), package)
            })
            .collect();
        Self { packages }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn get(&self, project: &ProjectId) -> Option<&LockedPackage> {
        self.packages.get(project)
    }

    /// Locked versions, for lock-preferring resolution
    pub fn pinned_versions(&self) -> BTreeMap<ProjectId, Version> {
        self.packages
            .iter()
            .map(|(project, package)| (project.clone(), package.version.clone()))
            .collect()
    }

    /// Direct dependencies the lock does not satisfy, either because the
    /// project is missing or because its locked version is out of range
    pub fn unsatisfied(&self, dependencies: &DependencyGroup) -> Vec<Dependency> {
        dependencies
            .iter()
            .filter(|dependency| match self.get(&dependency.project) {
                Some(package) => !dependency.requirement.matches(&package.version),
                None => true,
            })
            .collect()
    }

    /// References to projects that are not themselves locked, as
    /// `(from, to)` pairs
    pub fn dangling_references(&self) -> Vec<(ProjectId, ProjectId)> {
        self.packages
            .iter()
            .flat_map(|(project, package)| {
                package
                    .resolved
                    .references()
                    .iter()
                    .filter(|reference| !self.packages.contains_key(&reference.project))
                    .map(move |reference| (project.clone(), reference.project.clone()))
            })
            .collect()
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| TrellisError::JsonParse {
            what: LOCKFILE_NAME.to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(|e| TrellisError::JsonParse {
            what: LOCKFILE_NAME.to_string(),
            message: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Read a lock file; a missing file is `Ok(None)`
    pub async fn load(path: &Utf8Path) -> ConfigResult<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::parse(&content).map(Some).map_err(|e| match e {
                TrellisError::JsonParse { message, .. } => TrellisError::JsonParse {
                    what: path.to_string(),
                    message,
                },
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrellisError::io(format!("Failed to read {}", path), e)),
        }
    }

    pub async fn save(&self, path: &Utf8Path) -> ConfigResult<()> {
        let json = self.to_json_string()?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| TrellisError::io(format!("Failed to write {}", path), e))
    }
}
