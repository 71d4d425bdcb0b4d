//! Where the code for a project version comes from.
//!
//! A source is either a git commit or a remote archive. On the wire the two
//! shapes carry no explicit tag: a commit is a plain string
//! (`<url>#<commit>`) and an archive is an object. The tag is inferred from
//! the JSON shape when deserializing and is explicit everywhere else.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TrellisError;

/// A commit in a git repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitCommit {
    pub url: String,
    pub commit: String,
}

/// A downloadable archive, verified by hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoteArchive {
    pub url: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

/// A single downloadable file, verified by hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteFile {
    pub url: String,
    pub sha256: String,
}

/// Source of a project version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceDescriptor {
    Git(GitCommit),
    Archive(RemoteArchive),
}

impl GitCommit {
    pub fn new(url: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            commit: commit.into(),
        }
    }
}

impl fmt::Display for GitCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url, self.commit)
    }
}

impl FromStr for GitCommit {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('#') {
            Some((url, commit)) if !url.is_empty() && !commit.is_empty() => {
                Ok(GitCommit::new(url, commit))
            }
            _ => Err(TrellisError::JsonParse {
                what: "git commit".to_string(),
                message: format!("expected '<url>#<commit>', got '{}'", s),
            }),
        }
    }
}

impl Serialize for GitCommit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GitCommit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl SourceDescriptor {
    pub fn url(&self) -> &str {
        match self {
            SourceDescriptor::Git(commit) => &commit.url,
            SourceDescriptor::Archive(archive) => &archive.url,
        }
    }
}

impl From<GitCommit> for SourceDescriptor {
    fn from(commit: GitCommit) -> Self {
        SourceDescriptor::Git(commit)
    }
}

impl From<RemoteArchive> for SourceDescriptor {
    fn from(archive: RemoteArchive) -> Self {
        SourceDescriptor::Archive(archive)
    }
}

impl Serialize for SourceDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SourceDescriptor::Git(commit) => commit.serialize(serializer),
            SourceDescriptor::Archive(archive) => archive.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SourceDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SourceVisitor;

        impl<'de> Visitor<'de> for SourceVisitor {
            type Value = SourceDescriptor;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a '<url>#<commit>' string or a remote archive object")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value
                    .parse()
                    .map(SourceDescriptor::Git)
                    .map_err(de::Error::custom)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                RemoteArchive::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(SourceDescriptor::Archive)
            }
        }

        deserializer.deserialize_any(SourceVisitor)
    }
}
