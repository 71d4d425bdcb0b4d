//! Unit tests for CLI commands.

use super::*;
use std::collections::BTreeMap;
use tempfile::TempDir;
use trellis_core::types::{ProjectId, Version};

const MANIFEST: &str = r#"
[package]
name = "acme/app"

[dependencies]
"acme/zlib" = "^1.2.0"
"#;

const ZLIB: &str = r#"{
    "name": "zlib",
    "versions": {
        "1.2.8": {
            "source": "https://example.com/zlib.git#aaa",
            "dependencies": { "acme/shim": "^1.0.0" }
        },
        "1.2.11": {
            "source": "https://example.com/zlib.git#bbb",
            "target": "//:zlib",
            "dependencies": { "acme/shim": "^1.0.0" }
        }
    }
}"#;

const SHIM: &str = r#"{
    "name": "shim",
    "versions": {
        "1.0.0": { "source": "https://example.com/shim.git#ccc", "target": "//:shim" },
        "1.1.0": { "source": "https://example.com/shim.git#ddd", "target": "//:shim" }
    }
}"#;

fn id(s: &str) -> ProjectId {
    ProjectId::parse(s).unwrap()
}

/// A project with a manifest and two recipes
fn create_project(manifest: &str) -> (TempDir, Utf8PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();

    std::fs::write(root.join("trellis.toml"), manifest).unwrap();
    std::fs::create_dir_all(root.join("recipes/acme")).unwrap();
    std::fs::write(root.join("recipes/acme/zlib.json"), ZLIB).unwrap();
    std::fs::write(root.join("recipes/acme/shim.json"), SHIM).unwrap();

    (temp_dir, root)
}

fn create_test_context(cwd: Utf8PathBuf, cli: &[(&str, &str)]) -> CommandContext {
    CommandContext {
        cwd,
        output: OutputHandler::plain(),
        env_overrides: HashMap::new(),
        cli_overrides: cli.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        global_config: None,
    }
}

async fn locked_versions(root: &Utf8Path) -> BTreeMap<ProjectId, Version> {
    Lockfile::load(&root.join(LOCKFILE_NAME))
        .await
        .unwrap()
        .unwrap()
        .pinned_versions()
}

#[tokio::test]
async fn test_load_project_from_subdirectory() {
    let (_guard, root) = create_project(MANIFEST);
    let nested = root.join("src");
    std::fs::create_dir_all(&nested).unwrap();

    let ctx = create_test_context(nested, &[("strategy", "oldest")]);
    let project = load_project(&ctx).await.unwrap();

    assert_eq!(project.root, root);
    assert_eq!(project.recipes_dir(), root.join("recipes"));
    assert_eq!(project.manifest.resolver.strategy, StrategyKind::Oldest);
}

#[tokio::test]
async fn test_invalid_override_is_reported() {
    let (_guard, root) = create_project(MANIFEST);
    let ctx = create_test_context(root, &[("strategy", "fastest")]);

    assert!(load_project(&ctx).await.is_err());
}

#[tokio::test]
async fn test_resolve_project_newest_and_oldest() {
    let (_guard, root) = create_project(MANIFEST);

    let newest = resolve_project(&load_project(&create_test_context(root.clone(), &[])).await.unwrap())
        .await
        .unwrap();
    assert_eq!(newest.resolved.version_of(&id("acme/zlib")), Some(&Version::new(1, 2, 11)));
    assert_eq!(newest.resolved.version_of(&id("acme/shim")), Some(&Version::new(1, 1, 0)));

    let oldest_ctx = create_test_context(root, &[("strategy", "oldest")]);
    let oldest = resolve_project(&load_project(&oldest_ctx).await.unwrap()).await.unwrap();
    assert_eq!(oldest.resolved.version_of(&id("acme/zlib")), Some(&Version::new(1, 2, 8)));
    assert_eq!(oldest.resolved.version_of(&id("acme/shim")), Some(&Version::new(1, 0, 0)));
}

#[tokio::test]
async fn test_resolve_command_runs() {
    let (_guard, root) = create_project(MANIFEST);
    let ctx = create_test_context(root, &[]);

    resolve::execute(false, &ctx).await.unwrap();
    resolve::execute(true, &ctx).await.unwrap();
}

#[tokio::test]
async fn test_missing_recipe_fails_resolution() {
    let (_guard, root) = create_project(
        r#"
[package]
name = "acme/app"

[dependencies]
"acme/unknown" = "*"
"#,
    );
    let ctx = create_test_context(root, &[]);

    assert!(resolve::execute(false, &ctx).await.is_err());
}

#[tokio::test]
async fn test_lock_then_check() {
    let (_guard, root) = create_project(MANIFEST);
    let ctx = create_test_context(root.clone(), &[]);

    lock::execute(&ctx).await.unwrap();

    let versions = locked_versions(&root).await;
    assert_eq!(versions.get(&id("acme/zlib")), Some(&Version::new(1, 2, 11)));
    assert_eq!(versions.get(&id("acme/shim")), Some(&Version::new(1, 1, 0)));

    check::execute(&ctx).await.unwrap();
}

#[tokio::test]
async fn test_check_without_lock_fails() {
    let (_guard, root) = create_project(MANIFEST);
    let ctx = create_test_context(root, &[]);

    let err = check::execute(&ctx).await.unwrap_err();
    assert!(err.to_string().contains(LOCKFILE_NAME));
}

#[tokio::test]
async fn test_check_detects_stale_lock() {
    let (_guard, root) = create_project(MANIFEST);
    let ctx = create_test_context(root.clone(), &[("strategy", "oldest")]);
    lock::execute(&ctx).await.unwrap();

    // Tighten the requirement past the locked 1.2.8
    std::fs::write(
        root.join("trellis.toml"),
        MANIFEST.replace("^1.2.0", ">=1.2.10"),
    )
    .unwrap();

    assert!(check::execute(&create_test_context(root, &[])).await.is_err());
}

#[tokio::test]
async fn test_locked_strategy_keeps_lock() {
    let (_guard, root) = create_project(MANIFEST);

    lock::execute(&create_test_context(root.clone(), &[("strategy", "oldest")]))
        .await
        .unwrap();
    assert_eq!(
        locked_versions(&root).await.get(&id("acme/zlib")),
        Some(&Version::new(1, 2, 8))
    );

    // Newer versions exist, but the lock is preferred
    lock::execute(&create_test_context(root.clone(), &[("strategy", "locked")]))
        .await
        .unwrap();
    let versions = locked_versions(&root).await;
    assert_eq!(versions.get(&id("acme/zlib")), Some(&Version::new(1, 2, 8)));
    assert_eq!(versions.get(&id("acme/shim")), Some(&Version::new(1, 0, 0)));
}

#[test]
fn test_strategy_for_names() {
    assert_eq!(strategy_for(StrategyKind::Newest, None).name(), "newest");
    assert_eq!(strategy_for(StrategyKind::Oldest, None).name(), "oldest");
    assert_eq!(strategy_for(StrategyKind::Locked, None).name(), "locked");
}
