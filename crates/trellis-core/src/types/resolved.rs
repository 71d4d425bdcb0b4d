//! Accumulated resolution state.
//!
//! `ResolvedDependencies` is an immutable, persistent mapping from project
//! to its chosen version. Adding an entry returns a new instance that shares
//! every earlier entry with its parent, so fanning out over many candidate
//! versions from the same snapshot costs one allocation per branch.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{ProjectId, RecipeVersion, Version};

/// Chosen version of one project together with that version's recipe data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub version: Version,
    pub recipe_version: RecipeVersion,
}

/// Immutable mapping `ProjectId -> ResolvedEntry`
#[derive(Clone, Default)]
pub struct ResolvedDependencies {
    head: Option<Arc<Layer>>,
    len: usize,
}

/// One generation of the persistent chain
struct Layer {
    project: ProjectId,
    entry: ResolvedEntry,
    parent: Option<Arc<Layer>>,
}

impl ResolvedDependencies {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resolved projects
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up the entry chosen for `project`
    pub fn get(&self, project: &ProjectId) -> Option<&ResolvedEntry> {
        self.layers()
            .find(|layer| &layer.project == project)
            .map(|layer| &layer.entry)
    }

    pub fn version_of(&self, project: &ProjectId) -> Option<&Version> {
        self.get(project).map(|entry| &entry.version)
    }

    pub fn contains(&self, project: &ProjectId) -> bool {
        self.get(project).is_some()
    }

    /// Return a new state with `project` fixed to `version`.
    ///
    /// The receiver is left untouched. Callers check [`contains`] first;
    /// adding an already-resolved project shadows the earlier entry so the
    /// mapping still holds one version per project.
    ///
    /// [`contains`]: ResolvedDependencies::contains
    pub fn add(&self, project: ProjectId, version: Version, recipe_version: RecipeVersion) -> Self {
        let len = if self.contains(&project) {
            self.len
        } else {
            self.len + 1
        };
        Self {
            head: Some(Arc::new(Layer {
                project,
                entry: ResolvedEntry {
                    version,
                    recipe_version,
                },
                parent: self.head.clone(),
            })),
            len,
        }
    }

    /// Entries ordered by project
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectId, &ResolvedEntry)> {
        let mut entries = BTreeMap::new();
        for layer in self.layers() {
            // Newest layer first, so the first sighting wins
            entries.entry(&layer.project).or_insert(&layer.entry);
        }
        entries.into_iter()
    }

    /// Chosen versions ordered by project
    pub fn versions(&self) -> BTreeMap<ProjectId, Version> {
        self.iter()
            .map(|(project, entry)| (project.clone(), entry.version.clone()))
            .collect()
    }

    fn layers(&self) -> impl Iterator<Item = &Layer> {
        std::iter::successors(self.head.as_deref(), |layer| layer.parent.as_deref())
    }
}

impl PartialEq for ResolvedDependencies {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for ResolvedDependencies {}

impl fmt::Debug for ResolvedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(project, entry)| (project, &entry.version)))
            .finish()
    }
}

impl fmt::Display for ResolvedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (project, entry)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}@{}", project, entry.version)?;
        }
        Ok(())
    }
}

impl FromIterator<(ProjectId, Version, RecipeVersion)> for ResolvedDependencies {
    fn from_iter<I: IntoIterator<Item = (ProjectId, Version, RecipeVersion)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ResolvedDependencies::new(), |resolved, (project, version, recipe_version)| {
                resolved.add(project, version, recipe_version)
            })
    }
}

// The chain would otherwise drop recursively and can overflow the stack
// for very deep states.
impl Drop for Layer {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(layer) = parent {
            match Arc::try_unwrap(layer) {
                Ok(mut layer) => parent = layer.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GitCommit;

    fn id(s: &str) -> ProjectId {
        ProjectId::parse(s).unwrap()
    }

    fn recipe_version() -> RecipeVersion {
        RecipeVersion::new(GitCommit::new("https://x/y.git", "abc").into())
    }

    #[test]
    fn test_add_does_not_mutate_parent() {
        let empty = ResolvedDependencies::new();
        let one = empty.add(id("acme/zlib"), Version::new(1, 0, 0), recipe_version());

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.version_of(&id("acme/zlib")), Some(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_sibling_branches_are_independent() {
        let parent = ResolvedDependencies::new().add(id("acme/app"), Version::new(1, 0, 0), recipe_version());
        let left = parent.add(id("acme/zlib"), Version::new(1, 0, 0), recipe_version());
        let right = parent.add(id("acme/zlib"), Version::new(2, 0, 0), recipe_version());

        assert_eq!(parent.len(), 1);
        assert_eq!(left.version_of(&id("acme/zlib")), Some(&Version::new(1, 0, 0)));
        assert_eq!(right.version_of(&id("acme/zlib")), Some(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_shadowing_keeps_single_assignment() {
        let resolved = ResolvedDependencies::new()
            .add(id("acme/zlib"), Version::new(1, 0, 0), recipe_version())
            .add(id("acme/zlib"), Version::new(2, 0, 0), recipe_version());

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.iter().count(), 1);
        assert_eq!(resolved.version_of(&id("acme/zlib")), Some(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = ResolvedDependencies::new()
            .add(id("acme/a"), Version::new(1, 0, 0), recipe_version())
            .add(id("acme/b"), Version::new(2, 0, 0), recipe_version());
        let b = ResolvedDependencies::new()
            .add(id("acme/b"), Version::new(2, 0, 0), recipe_version())
            .add(id("acme/a"), Version::new(1, 0, 0), recipe_version());

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "acme/a@1.0.0, acme/b@2.0.0");
    }

    #[test]
    fn test_deep_chain_drops_without_overflow() {
        let resolved: ResolvedDependencies = (0..5_000)
            .map(|i| (id(&format!("deep/p{}", i)), Version::new(1, 0, 0), recipe_version()))
            .collect();
        assert_eq!(resolved.len(), 5_000);
        drop(resolved);
    }
}
