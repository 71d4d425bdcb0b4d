//! Semantic version types.
//!
//! Provides `Version` and `VersionReq`. A requirement is a conjunction of
//! comparators and acts as the satisfaction predicate used by the resolver.
//! Both types serialize as their string form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Semantic version (major.minor.patch-prerelease+build)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version requirement (`^1.0.0`, `~2.3`, `>=1.0.0 <2.0.0`, `*`)
///
/// Every comparator must match for the requirement to be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionReq {
    pub comparators: Vec<Comparator>,
}

/// Individual version comparator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: PartialVersion,
}

/// Comparison operator for version requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exact,     // =1.0.0
    Greater,   // >1.0.0
    GreaterEq, // >=1.0.0
    Less,      // <1.0.0
    LessEq,    // <=1.0.0
    Tilde,     // ~1.0.0
    Caret,     // ^1.0.0
    Wildcard,  // *
}

/// Partial version for comparisons (may have missing components)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialVersion {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub prerelease: Option<String>,
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },

    #[error("Invalid prerelease identifier: {prerelease}")]
    InvalidPrerelease { prerelease: String },

    #[error("Invalid version requirement: {input}")]
    InvalidRequirement { input: String },
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Check if this version satisfies a version requirement
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        req.matches(self)
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Semver precedence, ignoring build metadata
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

/// Dot-separated identifiers: numeric ones compare numerically and sort
/// before alphanumeric ones; a shorter identifier list sorts first.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(xn), Ok(yn)) => xn.cmp(&yn).then_with(|| x.cmp(y)),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn parse_number(component: &str) -> Result<u64, VersionError> {
    if component.is_empty() || (component.len() > 1 && component.starts_with('0')) {
        return Err(VersionError::InvalidNumber {
            component: component.to_string(),
        });
    }
    component.parse().map_err(|_| VersionError::InvalidNumber {
        component: component.to_string(),
    })
}

fn validate_identifiers(prerelease: &str) -> Result<(), VersionError> {
    let valid = prerelease.split('.').all(|identifier| {
        !identifier.is_empty()
            && identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if valid {
        Ok(())
    } else {
        Err(VersionError::InvalidPrerelease {
            prerelease: prerelease.to_string(),
        })
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let input = input.strip_prefix('v').unwrap_or(input);

        let (version_part, build) = match input.split_once('+') {
            Some((v, b)) => {
                validate_identifiers(b)?;
                (v, Some(b.to_string()))
            }
            None => (input, None),
        };

        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => {
                validate_identifiers(p)?;
                (c, Some(p.to_string()))
            }
            None => (version_part, None),
        };

        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        Ok(Version {
            major: parse_number(parts[0])?,
            minor: parse_number(parts[1])?,
            patch: parse_number(parts[2])?,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Build metadata only breaks ties so that `Ord` agrees with `Eq`.
impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl VersionReq {
    /// Requirement matching every version
    pub fn any() -> Self {
        VersionReq {
            comparators: vec![Comparator::wildcard()],
        }
    }

    /// Requirement matching exactly one version
    pub fn exact(version: &Version) -> Self {
        VersionReq {
            comparators: vec![Comparator {
                op: Op::Exact,
                version: PartialVersion::from(version),
            }],
        }
    }

    /// Parse a version requirement string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let tokens: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.is_empty() {
            return Err(VersionError::InvalidRequirement {
                input: input.to_string(),
            });
        }

        let mut comparators = Vec::with_capacity(tokens.len());
        let mut pending_op: Option<&str> = None;
        for token in tokens {
            // Allow `>= 1.0.0` with a space between operator and version
            if token.chars().all(|c| "<>=~^".contains(c)) {
                if pending_op.is_some() {
                    return Err(VersionError::InvalidRequirement {
                        input: input.to_string(),
                    });
                }
                pending_op = Some(token);
                continue;
            }
            let joined;
            let token = match pending_op.take() {
                Some(op) => {
                    joined = format!("{op}{token}");
                    joined.as_str()
                }
                None => token,
            };
            comparators.push(Comparator::parse(token)?);
        }

        if pending_op.is_some() {
            return Err(VersionError::InvalidRequirement {
                input: input.to_string(),
            });
        }

        Ok(VersionReq { comparators })
    }

    /// Check if a version matches this requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.comparators.iter().all(|comp| comp.matches(version))
    }
}

impl FromStr for VersionReq {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionReq::parse(s)
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comparator) in self.comparators.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", comparator)?;
        }
        Ok(())
    }
}

impl Serialize for VersionReq {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionReq {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionReq::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Comparator {
    fn wildcard() -> Self {
        Comparator {
            op: Op::Wildcard,
            version: PartialVersion {
                major: 0,
                minor: None,
                patch: None,
                prerelease: None,
            },
        }
    }

    fn parse(token: &str) -> Result<Self, VersionError> {
        if token == "*" || token == "x" || token == "X" {
            return Ok(Comparator::wildcard());
        }

        let (op, rest) = if let Some(stripped) = token.strip_prefix('^') {
            (Op::Caret, stripped)
        } else if let Some(stripped) = token.strip_prefix('~') {
            (Op::Tilde, stripped)
        } else if let Some(stripped) = token.strip_prefix(">=") {
            (Op::GreaterEq, stripped)
        } else if let Some(stripped) = token.strip_prefix("<=") {
            (Op::LessEq, stripped)
        } else if let Some(stripped) = token.strip_prefix('>') {
            (Op::Greater, stripped)
        } else if let Some(stripped) = token.strip_prefix('<') {
            (Op::Less, stripped)
        } else if let Some(stripped) = token.strip_prefix('=') {
            (Op::Exact, stripped)
        } else {
            (Op::Exact, token)
        };

        Ok(Comparator {
            op,
            version: PartialVersion::parse(rest)?,
        })
    }

    /// Check if a version matches this comparator
    pub fn matches(&self, version: &Version) -> bool {
        let partial = &self.version;
        match self.op {
            Op::Wildcard => true,
            Op::Exact => partial.matches_exact(version),
            Op::GreaterEq => version >= &partial.lower(),
            Op::Less => version < &partial.lower(),
            Op::Greater => match (partial.minor, partial.patch) {
                (Some(_), Some(_)) => version.precedence_cmp(&partial.lower()) == Ordering::Greater,
                _ => partial.next_unspecified().is_some_and(|next| version >= &next),
            },
            Op::LessEq => match (partial.minor, partial.patch) {
                (Some(_), Some(_)) => version.precedence_cmp(&partial.lower()) != Ordering::Greater,
                _ => below(version, partial.next_unspecified()),
            },
            Op::Tilde => version >= &partial.lower() && below(version, partial.next_unspecified()),
            Op::Caret => version >= &partial.lower() && below(version, partial.caret_upper()),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.op {
            Op::Wildcard => return f.write_str("*"),
            Op::Exact => "=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Tilde => "~",
            Op::Caret => "^",
        };
        write!(f, "{}{}", prefix, self.version)
    }
}

impl PartialVersion {
    fn parse(input: &str) -> Result<Self, VersionError> {
        let (core, prerelease) = match input.split_once('-') {
            Some((c, p)) => {
                validate_identifiers(p)?;
                (c, Some(p.to_string()))
            }
            None => (input, None),
        };

        let mut parts = core.split('.');
        let major = match parts.next() {
            Some(major) => parse_number(major)?,
            None => {
                return Err(VersionError::InvalidFormat {
                    input: input.to_string(),
                })
            }
        };
        let minor = parts.next().map(parse_component).transpose()?.flatten();
        let patch = parts.next().map(parse_component).transpose()?.flatten();
        if parts.next().is_some() || (minor.is_none() && patch.is_some()) {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }
        if prerelease.is_some() && patch.is_none() {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }

        Ok(PartialVersion {
            major,
            minor,
            patch,
            prerelease,
        })
    }

    /// Smallest version allowed by the specified components
    pub fn lower(&self) -> Version {
        Version {
            major: self.major,
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            prerelease: self.prerelease.clone(),
            build: None,
        }
    }

    /// First version past the range covered by the unspecified components.
    /// `None` when no such version is representable.
    fn next_unspecified(&self) -> Option<Version> {
        successor(self.major, self.minor)
    }

    /// Exclusive upper bound of a caret range: the left-most non-zero
    /// specified component may not change.
    fn caret_upper(&self) -> Option<Version> {
        match (self.major, self.minor, self.patch) {
            (0, Some(0), Some(patch)) => patch
                .checked_add(1)
                .map(|patch| Version::new(0, 0, patch))
                .or_else(|| successor(0, Some(0))),
            (0, Some(minor), _) => successor(0, Some(minor)),
            (major, _, _) => successor(major, None),
        }
    }

    fn matches_exact(&self, version: &Version) -> bool {
        version.major == self.major
            && self.minor.map_or(true, |m| version.minor == m)
            && self.patch.map_or(true, |p| version.patch == p)
            && (self.patch.is_none() || version.prerelease == self.prerelease)
    }
}

/// Smallest version past every `major.minor.*` (or `major.*.*`), carrying
/// into the major component when the minor one is exhausted
fn successor(major: u64, minor: Option<u64>) -> Option<Version> {
    minor
        .and_then(|minor| minor.checked_add(1))
        .map(|minor| Version::new(major, minor, 0))
        .or_else(|| major.checked_add(1).map(|major| Version::new(major, 0, 0)))
}

/// `version < upper`, where a missing bound admits everything
fn below(version: &Version, upper: Option<Version>) -> bool {
    upper.map_or(true, |upper| version < &upper)
}

fn parse_component(component: &str) -> Result<Option<u64>, VersionError> {
    match component {
        "*" | "x" | "X" => Ok(None),
        other => parse_number(other).map(Some),
    }
}

impl From<&Version> for PartialVersion {
    fn from(version: &Version) -> Self {
        PartialVersion {
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            prerelease: version.prerelease.clone(),
        }
    }
}

impl fmt::Display for PartialVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn req(s: &str) -> VersionReq {
        VersionReq::parse(s).unwrap()
    }

    #[test]
    fn test_version_parsing() {
        let parsed = v("1.2.3");
        assert_eq!(parsed, Version::new(1, 2, 3));

        let parsed = v("1.2.3-alpha.1+build.7");
        assert_eq!(parsed.prerelease, Some("alpha.1".to_string()));
        assert_eq!(parsed.build, Some("build.7".to_string()));
    }

    #[test]
    fn test_version_parsing_rejects_garbage() {
        assert!(Version::from_str("1.2").is_err());
        assert!(Version::from_str("1.2.x").is_err());
        assert!(Version::from_str("01.2.3").is_err());
        assert!(Version::from_str("1.2.3-").is_err());
    }

    #[test]
    fn test_version_display() {
        let version = Version {
            major: 1,
            minor: 2,
            patch: 3,
            prerelease: Some("alpha".to_string()),
            build: Some("build".to_string()),
        };
        assert_eq!(version.to_string(), "1.2.3-alpha+build");
    }

    #[test]
    fn test_prerelease_precedence() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_version_req_exact() {
        let exact = req("=1.2.3");
        assert!(exact.matches(&v("1.2.3")));
        assert!(!exact.matches(&v("1.2.4")));

        let bare = req("1.2");
        assert!(bare.matches(&v("1.2.9")));
        assert!(!bare.matches(&v("1.3.0")));
    }

    #[test]
    fn test_version_req_wildcard() {
        let any = req("*");
        assert!(any.matches(&v("0.0.1")));
        assert!(any.matches(&v("999.999.999")));
        assert_eq!(any, VersionReq::any());
    }

    #[test]
    fn test_version_req_caret() {
        let caret = req("^1.2.3");
        assert!(caret.matches(&v("1.2.3")));
        assert!(caret.matches(&v("1.9.0")));
        assert!(!caret.matches(&v("2.0.0")));
        assert!(!caret.matches(&v("1.2.2")));

        let zero_minor = req("^0.2.3");
        assert!(zero_minor.matches(&v("0.2.9")));
        assert!(!zero_minor.matches(&v("0.3.0")));

        let zero_patch = req("^0.0.3");
        assert!(zero_patch.matches(&v("0.0.3")));
        assert!(!zero_patch.matches(&v("0.0.4")));
    }

    #[test]
    fn test_version_req_tilde() {
        let tilde = req("~1.2.3");
        assert!(tilde.matches(&v("1.2.9")));
        assert!(!tilde.matches(&v("1.3.0")));

        let major_only = req("~1");
        assert!(major_only.matches(&v("1.9.9")));
        assert!(!major_only.matches(&v("2.0.0")));
    }

    #[test]
    fn test_version_req_operators() {
        assert!(req(">1.2.3").matches(&v("1.2.4")));
        assert!(!req(">1.2.3").matches(&v("1.2.3")));
        assert!(req(">1.2").matches(&v("1.3.0")));
        assert!(!req(">1.2").matches(&v("1.2.9")));
        assert!(req("<=1.2").matches(&v("1.2.9")));
        assert!(!req("<=1.2").matches(&v("1.3.0")));
        assert!(req("<1.2.4").matches(&v("1.2.3")));
        assert!(!req("<1.2.4").matches(&v("1.2.4")));
    }

    #[test]
    fn test_version_req_range() {
        let range = req(">=1.0.0 <2.0.0");
        assert_eq!(range.comparators.len(), 2);
        assert!(range.matches(&v("1.5.0")));
        assert!(!range.matches(&v("2.0.0")));

        let spaced = req(">= 1.0.0, < 2.0.0");
        assert_eq!(spaced, range);
    }

    #[test]
    fn test_version_req_rejects_garbage() {
        assert!(VersionReq::parse("").is_err());
        assert!(VersionReq::parse(">=").is_err());
        assert!(VersionReq::parse("^a.b").is_err());
    }

    #[test]
    fn test_version_req_display_reparses() {
        for input in ["^1.2.3", ">=1.0.0 <2.0.0", "~0.3", "*", "=2.0.0-rc.1"] {
            let parsed = req(input);
            assert_eq!(VersionReq::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_upper_bounds_at_component_limit() {
        let max = u64::MAX;

        let tilde = VersionReq::parse(&format!("~1.{}", max)).unwrap();
        assert!(!tilde.matches(&Version::new(1, 0, 0)));
        assert!(tilde.matches(&Version::new(1, max, 7)));
        assert!(!tilde.matches(&Version::new(2, 0, 0)));

        let caret = VersionReq::parse(&format!("^{}", max)).unwrap();
        assert!(caret.matches(&Version::new(max, 0, 0)));
        assert!(caret.matches(&Version::new(max, max, max)));
        assert!(!caret.matches(&Version::new(1, 0, 0)));

        let at_most = VersionReq::parse(&format!("<=1.{}", max)).unwrap();
        assert!(at_most.matches(&Version::new(1, 0, 0)));
        assert!(at_most.matches(&Version::new(1, max, 3)));
        assert!(!at_most.matches(&Version::new(2, 0, 0)));

        let greater = VersionReq::parse(&format!(">{}", max)).unwrap();
        assert!(!greater.matches(&Version::new(max, max, max)));

        let patch_caret = VersionReq::parse(&format!("^0.0.{}", max)).unwrap();
        assert!(patch_caret.matches(&Version::new(0, 0, max)));
        assert!(!patch_caret.matches(&Version::new(0, 1, 0)));
    }

    #[test]
    fn test_serde_as_strings() {
        let json = serde_json::to_string(&v("1.0.0-beta")).unwrap();
        assert_eq!(json, "\"1.0.0-beta\"");
        let parsed: VersionReq = serde_json::from_str("\">=1.5.0\"").unwrap();
        assert!(parsed.matches(&v("2.0.0")));
        assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
    }
}
