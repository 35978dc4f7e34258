use serial_test::serial;
use slicegraph_config::{load_config, FieldNameStyle, DEFAULT_MAX_CONCURRENT_DOWNLOADS};
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn test_load_config_from_project_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".slicegraph");
    fs::create_dir(&config_dir).unwrap();
    fs::write(
        config_dir.join("slicegraph.yaml"),
        r#"
type_prefix: Cms
field_names: camel
images:
  normalize: true
  cache_dir: /var/cache/slicegraph
"#,
    )
    .unwrap();

    // Change to the temp directory so the config file is discovered
    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(temp_dir.path()).unwrap();
    let result = load_config();
    env::set_current_dir(original_dir).unwrap();

    let config = result.unwrap();
    assert_eq!(config.type_prefix, "Cms");
    assert_eq!(config.field_names, FieldNameStyle::Camel);
    assert!(config.images.normalize);
    assert_eq!(
        config.images.cache_dir,
        std::path::PathBuf::from("/var/cache/slicegraph")
    );
    assert_eq!(
        config.images.max_concurrent_downloads,
        DEFAULT_MAX_CONCURRENT_DOWNLOADS
    );
}

#[test]
#[serial]
fn test_load_config_reports_broken_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".slicegraph");
    fs::create_dir(&config_dir).unwrap();
    fs::write(config_dir.join("slicegraph.toml"), "type_prefix = [").unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(temp_dir.path()).unwrap();
    let result = load_config();
    env::set_current_dir(original_dir).unwrap();

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse configuration"));
}
