//! Dependency edges and per-version dependency groups.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ProjectId, VersionReq};

/// One edge of the dependency graph: a project plus a requirement on it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub project: ProjectId,
    pub requirement: VersionReq,
}

/// The dependencies a single version declares.
///
/// Insertion order is kept because it is the order in which the resolver
/// folds over the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGroup {
    entries: IndexMap<ProjectId, VersionReq>,
}

impl Dependency {
    /// Create a new dependency
    pub fn new(project: ProjectId, requirement: VersionReq) -> Self {
        Self {
            project,
            requirement,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.requirement)
    }
}

impl DependencyGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency; a second entry for the same project replaces the
    /// requirement but keeps the original position
    pub fn insert(&mut self, dependency: Dependency) {
        self.entries.insert(dependency.project, dependency.requirement);
    }

    /// Builder-style variant of [`DependencyGroup::insert`]
    pub fn with(mut self, dependency: Dependency) -> Self {
        self.insert(dependency);
        self
    }

    pub fn requirement(&self, project: &ProjectId) -> Option<&VersionReq> {
        self.entries.get(project)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate dependencies in resolution order
    pub fn iter(&self) -> impl Iterator<Item = Dependency> + '_ {
        self.entries
            .iter()
            .map(|(project, requirement)| Dependency::new(project.clone(), requirement.clone()))
    }

    /// Dependencies in resolution order
    pub fn entries(&self) -> Vec<Dependency> {
        self.iter().collect()
    }
}

impl FromIterator<Dependency> for DependencyGroup {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut group = DependencyGroup::new();
        for dependency in iter {
            group.insert(dependency);
        }
        group
    }
}
