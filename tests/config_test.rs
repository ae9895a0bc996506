use apiref::config::*;
use apiref::schema::DEFAULT_SCHEMA_AUTHORITY;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = ResolverConfig::default();
    assert!(!config.strict);
    assert!(config.synthesize_missing_tags);
    assert_eq!(config.schema_authority, DEFAULT_SCHEMA_AUTHORITY);
}

#[test]
fn test_load_missing_config_returns_default() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(loaded, ResolverConfig::default());
}

#[test]
fn test_save_and_load_config() {
    let dir = TempDir::new().unwrap();
    let config = ResolverConfig {
        strict: true,
        schema_authority: "http://example.test".to_string(),
        ..ResolverConfig::default()
    };
    save_config(dir.path(), &config).unwrap();
    assert!(get_config_path(dir.path()).exists());
    assert!(!get_config_path(dir.path()).with_extension("json.partial").exists());

    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_apiref_dir(dir.path())).unwrap();
    std::fs::write(get_config_path(dir.path()), r#"{ "strict": true }"#).unwrap();

    let loaded = load_config(dir.path()).unwrap();
    assert!(loaded.strict);
    assert_eq!(loaded.schema_authority, DEFAULT_SCHEMA_AUTHORITY);
}

#[test]
fn test_invalid_config_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_apiref_dir(dir.path())).unwrap();
    std::fs::write(get_config_path(dir.path()), "not json").unwrap();

    let err = load_config(dir.path()).unwrap_err();
    assert!(err.to_string().starts_with("config error: invalid resolver settings in"));
}

#[test]
fn test_save_config_reports_unwritable_project() {
    let dir = TempDir::new().unwrap();
    let not_a_dir = dir.path().join("project");
    std::fs::write(&not_a_dir, "").unwrap();

    let err = save_config(&not_a_dir, &ResolverConfig::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("config error: cannot create"), "{}", message);
    assert!(message.contains(".apiref"));
}

#[test]
fn test_apiref_dir_location() {
    let dir = TempDir::new().unwrap();
    let apiref_dir = get_apiref_dir(dir.path());
    assert!(apiref_dir.ends_with(".apiref"));
}
