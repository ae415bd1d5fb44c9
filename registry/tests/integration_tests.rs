use std::path::{Path, PathBuf};

use partial_schema_core::{Identity, RegistryProvider, SectionKind, Version};
use partial_schema_registry::{
    AggregatorConfig, Manifest, PartialMetadata, ProviderRegistry, RegistryError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn users() -> Identity {
    Identity::new("users", Some(Version::new(1, 0, 0)))
}

fn identities(registry: &ProviderRegistry) -> Vec<String> {
    registry
        .snapshot()
        .keys()
        .map(ToString::to_string)
        .collect()
}

fn write_partial(dir: &Path, file_name: &str, text: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, text).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Module directories
// ---------------------------------------------------------------------------

#[test]
fn test_module_dir_loading() {
    let registry = ProviderRegistry::new();
    let id = registry.add_module_dir(fixtures().join("module_a")).unwrap();

    // notes.md is not a partial, broken.txt has no PARTIAL section, and
    // nested/ is not scanned
    assert_eq!(identities(&registry), ["base.scalars", "users-1.0.0"]);

    let modules = registry.modules();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].id, id);
    assert!(modules[0].name.ends_with("module_a"));
    assert_eq!(modules[0].partials.len(), 2);

    let users = registry.get(&users()).unwrap();
    assert!(users.source().ends_with("users-1.0.0.txt"));
    assert!(users.requires().contains(&Identity::new("base.scalars", None)));
    let query = users.section(SectionKind::Query).unwrap();
    assert_eq!(query.read_to_string().unwrap().trim(), "user(id: ID!): User");
}

#[test]
fn test_first_module_wins_across_directories() {
    let registry = ProviderRegistry::new();
    registry.add_module_dir(fixtures().join("module_a")).unwrap();
    let b = registry.add_module_dir(fixtures().join("module_b")).unwrap();

    assert_eq!(
        identities(&registry),
        ["base.scalars", "pages", "users-1.0.0"]
    );
    let users = registry.get(&users()).unwrap();
    assert_eq!(
        users.section(SectionKind::Partial).unwrap().description(),
        "Users and their lookup"
    );

    let module_b = registry
        .modules()
        .into_iter()
        .find(|module| module.id == b)
        .unwrap();
    assert_eq!(module_b.partials, [Identity::new("pages", None)]);
}

#[test]
fn test_remove_module_dir() {
    let registry = ProviderRegistry::new();
    let a = registry.add_module_dir(fixtures().join("module_a")).unwrap();
    registry.add_module_dir(fixtures().join("module_b")).unwrap();

    let before = registry.snapshot();
    assert!(registry.remove_module(a));

    assert_eq!(identities(&registry), ["pages"]);
    assert_eq!(before.len(), 3);
}

#[test]
fn test_missing_module_dir() {
    let registry = ProviderRegistry::new();
    let err = registry
        .add_module_dir(fixtures().join("does-not-exist"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotADirectory(_)));
    assert!(registry.modules().is_empty());
}

#[test]
fn test_files_are_reread_on_section_access() {
    let dir = tempfile::tempdir().unwrap();
    write_partial(dir.path(), "p.txt", "PARTIAL: p\nQUERY:\n  p: String\n");

    let registry = ProviderRegistry::new();
    registry.add_module_dir(dir.path()).unwrap();
    let doc = registry.get(&Identity::new("p", None)).unwrap();

    std::fs::remove_file(dir.path().join("p.txt")).unwrap();
    assert!(doc.section(SectionKind::Query).unwrap().read_to_string().is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinked_partials_are_loaded() {
    let target = tempfile::tempdir().unwrap();
    let real = write_partial(
        target.path(),
        "linked.txt",
        "PARTIAL: linked\nQUERY:\nl: String\n",
    );

    let dir = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("linked.txt")).unwrap();
    std::os::unix::fs::symlink(target.path(), dir.path().join("subdir.txt")).unwrap();

    let registry = ProviderRegistry::new();
    registry.add_module_dir(dir.path()).unwrap();

    assert_eq!(identities(&registry), ["linked"]);
    let doc = registry.get(&Identity::new("linked", None)).unwrap();
    let query = doc.section(SectionKind::Query).unwrap();
    assert_eq!(query.read_to_string().unwrap(), "l: String\n");
}

#[test]
fn test_registry_provider_snapshot() {
    let registry = ProviderRegistry::new();
    registry.add_module_dir(fixtures().join("module_a")).unwrap();

    let provider: &dyn RegistryProvider = &registry;
    let snapshot = provider.snapshot();
    assert_eq!(snapshot.len(), 2);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_fixture_registers_modules() {
    let config = AggregatorConfig::load(fixtures().join("aggregate.yml")).unwrap();
    assert_eq!(config.selectors, ["pages"]);
    assert_eq!(config.tool_name.as_deref(), Some("FixtureAggregator"));

    let config = AggregatorConfig {
        modules: config
            .modules
            .iter()
            .map(|module| fixtures().join(module))
            .collect(),
        ..config
    };
    let registry = ProviderRegistry::new();
    let ids = config.register_modules(&registry).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_invalid_config_is_yaml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    std::fs::write(&path, "version: [unclosed\n").unwrap();

    let err = AggregatorConfig::load(&path).unwrap_err();
    assert!(matches!(err, RegistryError::YamlError(_)));
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

#[test]
fn test_manifest_from_registry_snapshot() {
    let registry = ProviderRegistry::new();
    registry.add_module_dir(fixtures().join("module_a")).unwrap();
    let snapshot = registry.snapshot();

    let manifest = Manifest::from_documents(
        "0.1.0".into(),
        vec!["users-1.0.0".into()],
        snapshot.values().map(|doc| doc.as_ref()),
    );
    assert_eq!(manifest.partials.len(), 2);

    let users_meta = manifest.get("users-1.0.0").unwrap();
    assert_eq!(users_meta.requires, ["base.scalars"]);
    let on_disk = Manifest::calculate_digest(fixtures().join("module_a/users-1.0.0.txt")).unwrap();
    assert_eq!(users_meta.digest, on_disk);
}

#[test]
fn test_manifest_diff_after_edit() {
    let dir = tempfile::tempdir().unwrap();
    write_partial(dir.path(), "a.txt", "PARTIAL: a\n");
    write_partial(dir.path(), "b.txt", "PARTIAL: b\n");

    let snapshot_manifest = |dir: &Path| {
        let registry = ProviderRegistry::new();
        registry.add_module_dir(dir).unwrap();
        let snapshot = registry.snapshot();
        Manifest::from_documents(
            "0.1.0".into(),
            Vec::new(),
            snapshot.values().map(|doc| doc.as_ref()),
        )
    };

    let before = snapshot_manifest(dir.path());
    write_partial(dir.path(), "b.txt", "PARTIAL: b, edited\n");
    write_partial(dir.path(), "c.txt", "PARTIAL: c\n");
    let after = snapshot_manifest(dir.path());

    assert_eq!(before.diff(&after), ["b", "c"]);
    assert!(after.diff(&after).is_empty());
}

#[test]
fn test_manifest_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");

    let mut manifest = Manifest::new("0.1.0".into(), vec!["/.*/".into()]);
    manifest.update_entry(
        "a".into(),
        PartialMetadata {
            digest: "SHA-256: 00".into(),
            source: "a.txt".into(),
            requires: Vec::new(),
        },
    );
    manifest.save(&path).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.contains("\"updated_at\""));
    assert!(json.contains("\"tool_version\": \"0.1.0\""));

    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded.selectors, ["/.*/"]);
    assert!(loaded.contains("a"));
}

#[test]
fn test_invalid_manifest_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = Manifest::load(&path).unwrap_err();
    assert!(matches!(err, RegistryError::JsonError(_)));
}
