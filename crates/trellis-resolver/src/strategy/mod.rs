//! Scoring policies used to pick among competing solutions
//!
//! When several candidate versions of a dependency lead to a complete
//! state, the engine keeps the state with the highest [`Score`]. Ties go to
//! the candidate discovered first, i.e. the lowest version.

use std::collections::BTreeMap;
use std::fmt;

use trellis_core::types::{ProjectId, ResolvedDependencies, Version};

/// Lexicographically ordered score; higher wins
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(pub Vec<i128>);

impl Score {
    pub fn components(&self) -> &[i128] {
        &self.0
    }

    fn negated(self) -> Self {
        Score(self.0.into_iter().map(|component| -component).collect())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(i128::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// A pure, deterministic ranking of complete candidate states
pub trait ResolutionStrategy: Send + Sync + fmt::Debug {
    fn score(&self, resolved: &ResolvedDependencies) -> Score;

    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;
}

/// Component-wise sum over all chosen versions: majors, then minors, then
/// patches, then the number of non-prerelease versions.
fn version_sum(resolved: &ResolvedDependencies) -> Score {
    let mut sums = [0i128; 4];
    for (_, entry) in resolved.iter() {
        let version = &entry.version;
        sums[0] += i128::from(version.major);
        sums[1] += i128::from(version.minor);
        sums[2] += i128::from(version.patch);
        sums[3] += i128::from(!version.is_prerelease());
    }
    Score(sums.to_vec())
}

/// Prefers the overall newest combination. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestResolutionStrategy;

impl ResolutionStrategy for NewestResolutionStrategy {
    fn score(&self, resolved: &ResolvedDependencies) -> Score {
        version_sum(resolved)
    }

    fn name(&self) -> &'static str {
        "newest"
    }
}

/// Prefers the overall oldest combination
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestResolutionStrategy;

impl ResolutionStrategy for OldestResolutionStrategy {
    fn score(&self, resolved: &ResolvedDependencies) -> Score {
        version_sum(resolved).negated()
    }

    fn name(&self) -> &'static str {
        "oldest"
    }
}

/// Prefers solutions that keep previously locked versions, falling back to
/// the newest combination among equally faithful ones
#[derive(Debug, Clone, Default)]
pub struct LockedResolutionStrategy {
    pinned: BTreeMap<ProjectId, Version>,
}

impl LockedResolutionStrategy {
    pub fn new(pinned: BTreeMap<ProjectId, Version>) -> Self {
        Self { pinned }
    }

    pub fn pinned(&self) -> &BTreeMap<ProjectId, Version> {
        &self.pinned
    }
}

impl ResolutionStrategy for LockedResolutionStrategy {
    fn score(&self, resolved: &ResolvedDependencies) -> Score {
        let kept = resolved
            .iter()
            .filter(|(project, entry)| self.pinned.get(*project) == Some(&entry.version))
            .count();

        let mut components = vec![kept as i128];
        components.extend(version_sum(resolved).0);
        Score(components)
    }

    fn name(&self) -> &'static str {
        "locked"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trellis_core::types::{GitCommit, RecipeVersion};

    fn id(s: &str) -> ProjectId {
        ProjectId::parse(s).unwrap()
    }

    fn state(entries: &[(&str, Version)]) -> ResolvedDependencies {
        entries
            .iter()
            .map(|(project, version)| {
                (
                    id(project),
                    version.clone(),
                    RecipeVersion::new(GitCommit::new("https://x/y.git", "abc").into()),
                )
            })
            .collect()
    }

    #[test]
    fn test_newest_prefers_higher_versions() {
        let old = state(&[("acme/d", Version::new(1, 0, 0))]);
        let new = state(&[("acme/d", Version::new(2, 0, 0))]);

        let strategy = NewestResolutionStrategy;
        assert!(strategy.score(&new) > strategy.score(&old));
    }

    #[test]
    fn test_newest_prefers_release_over_prerelease() {
        let pre: Version = "1.0.0-rc.1".parse().unwrap();
        let release = Version::new(1, 0, 0);

        let strategy = NewestResolutionStrategy;
        assert!(strategy.score(&state(&[("acme/d", release)])) > strategy.score(&state(&[("acme/d", pre)])));
    }

    #[test]
    fn test_oldest_reverses_newest() {
        let old = state(&[("acme/d", Version::new(1, 0, 0))]);
        let new = state(&[("acme/d", Version::new(1, 5, 0))]);

        let strategy = OldestResolutionStrategy;
        assert!(strategy.score(&old) > strategy.score(&new));
    }

    #[test]
    fn test_locked_prefers_pinned_versions() {
        let pinned = BTreeMap::from([(id("acme/d"), Version::new(1, 0, 0))]);
        let strategy = LockedResolutionStrategy::new(pinned);

        let kept = state(&[("acme/d", Version::new(1, 0, 0))]);
        let upgraded = state(&[("acme/d", Version::new(2, 0, 0))]);
        assert!(strategy.score(&kept) > strategy.score(&upgraded));

        // Among solutions keeping the same pins, newer still wins
        let kept_plus_new = state(&[("acme/d", Version::new(1, 0, 0)), ("acme/e", Version::new(3, 0, 0))]);
        let kept_plus_old = state(&[("acme/d", Version::new(1, 0, 0)), ("acme/e", Version::new(2, 0, 0))]);
        assert!(strategy.score(&kept_plus_new) > strategy.score(&kept_plus_old));
    }

    #[test]
    fn test_names() {
        assert_eq!(NewestResolutionStrategy.name(), "newest");
        assert_eq!(OldestResolutionStrategy.name(), "oldest");
        assert_eq!(LockedResolutionStrategy::default().name(), "locked");
    }

    proptest! {
        #[test]
        fn prop_raising_a_version_never_lowers_newest_score(
            major in 0u64..50, minor in 0u64..50, patch in 0u64..50, bump in 1u64..10
        ) {
            let base = state(&[("acme/a", Version::new(major, minor, patch)), ("acme/b", Version::new(1, 0, 0))]);
            let raised = state(&[("acme/a", Version::new(major, minor, patch + bump)), ("acme/b", Version::new(1, 0, 0))]);

            prop_assert!(NewestResolutionStrategy.score(&raised) > NewestResolutionStrategy.score(&base));
            prop_assert!(OldestResolutionStrategy.score(&raised) < OldestResolutionStrategy.score(&base));
        }

        #[test]
        fn prop_score_is_deterministic(versions in prop::collection::vec((0u64..20, 0u64..20, 0u64..20), 1..8)) {
            let entries: Vec<(String, Version)> = versions
                .iter()
                .enumerate()
                .map(|(i, (ma, mi, pa))| (format!("acme/p{}", i), Version::new(*ma, *mi, *pa)))
                .collect();
            let borrowed: Vec<(&str, Version)> = entries.iter().map(|(p, v)| (p.as_str(), v.clone())).collect();

            let first = state(&borrowed);
            let second = state(&borrowed);
            prop_assert_eq!(NewestResolutionStrategy.score(&first), NewestResolutionStrategy.score(&second));
        }
    }
}
