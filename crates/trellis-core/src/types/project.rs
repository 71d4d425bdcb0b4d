//! Project identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{TrellisError, TrellisResult};

/// Stable identity of a project: `namespace/name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId {
    pub namespace: String,
    pub name: String,
}

impl ProjectId {
    /// Create a project identifier, validating both segments
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> TrellisResult<Self> {
        let namespace = namespace.into();
        let name = name.into();
        for segment in [&namespace, &name] {
            if let Err(reason) = validate_segment(segment) {
                return Err(TrellisError::InvalidProjectId {
                    input: format!("{}/{}", namespace, name),
                    reason,
                });
            }
        }
        Ok(Self { namespace, name })
    }

    /// Parse `namespace/name`
    pub fn parse(input: &str) -> TrellisResult<Self> {
        let input = input.trim();
        match input.split_once('/') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Err(TrellisError::InvalidProjectId {
                input: input.to_string(),
                reason: "expected 'namespace/name'".to_string(),
            }),
        }
    }
}

fn validate_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("segments must not be empty".to_string());
    }
    match segment
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.".contains(*c)))
    {
        Some(c) => Err(format!("unexpected character '{}'", c)),
        None => Ok(()),
    }
}

impl FromStr for ProjectId {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectId::parse(s)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProjectId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = ProjectId::parse("acme/zlib-ng").unwrap();
        assert_eq!(id.namespace, "acme");
        assert_eq!(id.name, "zlib-ng");
        assert_eq!(id.to_string(), "acme/zlib-ng");
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(ProjectId::parse("zlib").is_err());
        assert!(ProjectId::parse("/zlib").is_err());
        assert!(ProjectId::parse("acme/").is_err());
        assert!(ProjectId::parse("acme/Zlib").is_err());
        assert!(ProjectId::parse("acme/z/lib").is_err());
    }

    #[test]
    fn test_ordering_is_namespace_then_name() {
        let a = ProjectId::parse("a/z").unwrap();
        let b = ProjectId::parse("b/a").unwrap();
        assert!(a < b);
    }
}
