//! trellis.toml parsing and serialization

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use trellis_core::error::TrellisError;
use trellis_core::types::{Dependency, DependencyGroup, ProjectId, Version, VersionReq};

use crate::ConfigResult;

/// File name of the project manifest
pub const MANIFEST_NAME: &str = "trellis.toml";

/// Complete trellis.toml configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Package metadata section
    pub package: PackageSection,

    /// Direct dependencies, `"namespace/name" = "<requirement>"`.
    /// Document order is the order they are resolved in.
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverSection,
}

/// Package metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSection {
    /// Project identifier, `namespace/name` (required)
    pub name: String,

    /// Project version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// License identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// `[resolver]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResolverSection {
    /// How competing solutions are ranked
    pub strategy: StrategyKind,
    /// Recipe directory, relative to the manifest
    pub recipes: Utf8PathBuf,
    /// Lifetime of cached recipes
    pub cache_ttl_secs: u64,
    /// Retries for recoverable recipe fetch failures
    pub max_retries: u32,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            recipes: Utf8PathBuf::from("recipes"),
            cache_ttl_secs: 3600,
            max_retries: 3,
        }
    }
}

/// Named resolution strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Prefer the newest overall combination
    #[default]
    Newest,
    /// Prefer the oldest overall combination
    Oldest,
    /// Prefer keeping the versions in the lock file
    Locked,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [StrategyKind::Newest, StrategyKind::Oldest, StrategyKind::Locked];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Newest => "newest",
            StrategyKind::Oldest => "oldest",
            StrategyKind::Locked => "locked",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TrellisError::ConfigValidation {
                field: "strategy".to_string(),
                reason: format!("unknown strategy '{}', expected newest, oldest or locked", s),
            })
    }
}

impl Manifest {
    /// Identifier of the project this manifest describes
    pub fn project_id(&self) -> ConfigResult<ProjectId> {
        ProjectId::parse(&self.package.name).map_err(|e| TrellisError::ConfigValidation {
            field: "package.name".to_string(),
            reason: e.to_string(),
        })
    }

    /// Direct dependencies in resolution order
    pub fn dependency_group(&self) -> ConfigResult<DependencyGroup> {
        self.dependencies
            .iter()
            .map(|(name, requirement)| parse_dependency(name, requirement))
            .collect()
    }

    /// Recipe directory, resolved against the directory holding the manifest
    pub fn recipes_dir(&self, manifest_dir: &Utf8Path) -> Utf8PathBuf {
        manifest_dir.join(&self.resolver.recipes)
    }
}

fn parse_dependency(name: &str, requirement: &str) -> ConfigResult<Dependency> {
    let field = format!("dependencies.{}", name);
    let project = ProjectId::parse(name).map_err(|e| TrellisError::ConfigValidation {
        field: field.clone(),
        reason: e.to_string(),
    })?;
    let requirement = VersionReq::parse(requirement).map_err(|e| TrellisError::ConfigValidation {
        field,
        reason: e.to_string(),
    })?;
    Ok(Dependency::new(project, requirement))
}

/// Parse TOML string to a manifest
pub fn parse_manifest(content: &str) -> ConfigResult<Manifest> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| TrellisError::TomlParse {
            message: format!("TOML syntax error: {}", e),
        })?;

    // Then parse with serde for type safety
    let manifest: Manifest = toml::from_str(content).map_err(|e| TrellisError::TomlParse {
        message: format!("TOML parsing error: {}", e),
    })?;

    validate_manifest(&manifest)?;

    Ok(manifest)
}

/// Serialize a manifest to a TOML string
pub fn serialize_manifest(manifest: &Manifest) -> ConfigResult<String> {
    toml::to_string_pretty(manifest).map_err(|e| TrellisError::TomlParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_manifest(manifest: &Manifest) -> ConfigResult<()> {
    let project = manifest.project_id()?;

    let dependencies = manifest.dependency_group()?;
    if dependencies.requirement(&project).is_some() {
        return Err(TrellisError::ConfigValidation {
            field: format!("dependencies.{}", project),
            reason: "a project cannot depend on itself".to_string(),
        });
    }

    if manifest.resolver.recipes.as_str().is_empty() {
        return Err(TrellisError::ConfigValidation {
            field: "resolver.recipes".to_string(),
            reason: "recipe directory must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Load and parse trellis.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<Manifest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TrellisError::io(format!("Failed to read {}", path), e))?;

    parse_manifest(&content).map_err(|e| match e {
        TrellisError::TomlParse { message } => TrellisError::TomlParse {
            message: format!("In file {}: {}", path, message),
        },
        TrellisError::ConfigValidation { field, reason } => TrellisError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let toml = r#"
[package]
name = "acme/app"
"#;

        let manifest = parse_manifest(toml).unwrap();
        assert_eq!(manifest.package.name, "acme/app");
        assert!(manifest.package.version.is_none());
        assert!(manifest.dependencies.is_empty());
        assert_eq!(manifest.resolver, ResolverSection::default());
    }

    #[test]
    fn test_dependencies_keep_document_order() {
        let toml = r#"
[package]
name = "acme/app"
version = "0.1.0"

[dependencies]
"acme/zlib" = "^1.2.0"
"acme/fmt" = ">=5.0.0 <7.0.0"
"acme/boost" = "*"
"#;

        let manifest = parse_manifest(toml).unwrap();
        let order: Vec<String> = manifest
            .dependency_group()
            .unwrap()
            .iter()
            .map(|dependency| dependency.project.to_string())
            .collect();
        assert_eq!(order, vec!["acme/zlib", "acme/fmt", "acme/boost"]);
    }

    #[test]
    fn test_resolver_section() {
        let toml = r#"
[package]
name = "acme/app"

[resolver]
strategy = "oldest"
recipes = "vendor/recipes"
cache-ttl-secs = 60
max-retries = 0
"#;

        let manifest = parse_manifest(toml).unwrap();
        assert_eq!(manifest.resolver.strategy, StrategyKind::Oldest);
        assert_eq!(manifest.resolver.recipes, Utf8PathBuf::from("vendor/recipes"));
        assert_eq!(manifest.resolver.cache_ttl_secs, 60);
        assert_eq!(manifest.resolver.max_retries, 0);
        assert_eq!(
            manifest.recipes_dir(Utf8Path::new("/work/app")),
            Utf8PathBuf::from("/work/app/vendor/recipes")
        );
    }

    #[test]
    fn test_invalid_requirement_names_the_dependency() {
        let toml = r#"
[package]
name = "acme/app"

[dependencies]
"acme/zlib" = "not a version"
"#;

        match parse_manifest(toml).unwrap_err() {
            TrellisError::ConfigValidation { field, .. } => assert_eq!(field, "dependencies.acme/zlib"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_package_name() {
        let toml = r#"
[package]
name = "NoNamespace"
"#;

        assert!(matches!(
            parse_manifest(toml),
            Err(TrellisError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let toml = r#"
[package]
name = "acme/app"

[dependencies]
"acme/app" = "*"
"#;

        assert!(parse_manifest(toml).is_err());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_manifest("[package\nname = 1").unwrap_err();
        assert!(matches!(err, TrellisError::TomlParse { .. }));
        assert!(err.to_string().contains("syntax"));
    }

    #[test]
    fn test_unknown_strategy() {
        let toml = r#"
[package]
name = "acme/app"

[resolver]
strategy = "fastest"
"#;

        assert!(matches!(parse_manifest(toml), Err(TrellisError::TomlParse { .. })));
        assert!("fastest".parse::<StrategyKind>().is_err());
        assert_eq!("locked".parse::<StrategyKind>().unwrap(), StrategyKind::Locked);
    }

    #[test]
    fn test_round_trip_serialization() {
        let toml = r#"
[package]
name = "acme/app"
version = "1.0.0"
description = "An application"

[dependencies]
"acme/zlib" = "^1.2.11"
"acme/fmt" = "~5.3"
"#;

        let manifest = parse_manifest(toml).unwrap();
        let serialized = serialize_manifest(&manifest).unwrap();
        let reparsed = parse_manifest(&serialized).unwrap();

        assert_eq!(manifest, reparsed);
    }

    proptest::proptest! {
        #[test]
        fn prop_dependency_order_follows_document(names in proptest::collection::btree_set("[a-z]{1,8}", 1..12)) {
            // BTreeSet yields sorted names; reverse them so document order differs from sorted order
            let names: Vec<String> = names.into_iter().rev().collect();
            let mut toml = String::from("[package]\nname = \"acme/app\"\n\n[dependencies]\n");
            for name in &names {
                toml.push_str(&format!("\"deps/{}\" = \"*\"\n", name));
            }

            let manifest = parse_manifest(&toml).unwrap();
            let order: Vec<String> = manifest
                .dependency_group()
                .unwrap()
                .iter()
                .map(|dependency| dependency.project.name)
                .collect();
            proptest::prop_assert_eq!(order, names);
        }
    }

    #[tokio::test]
    async fn test_load_from_file_reports_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join(MANIFEST_NAME)).unwrap();
        tokio::fs::write(&path, "[package]\nname = \"bad\"\n").await.unwrap();

        let err = load_from_file(&path).await.unwrap_err();
        assert!(err.to_string().contains(MANIFEST_NAME) || format!("{:?}", err).contains(MANIFEST_NAME));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_from_file(Utf8Path::new("/definitely/not/here/trellis.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrellisError::Io { .. }));
    }
}
