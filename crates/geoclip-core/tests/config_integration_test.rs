//! Integration tests for layered configuration
//!
//! Configuration loading must follow the precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geoclip_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

const ENV_KEYS: [&str; 5] = [
    "GEOCLIP_WORK_DIR",
    "GEOCLIP_OUTPUT_EPSG",
    "GEOCLIP_OUTPUT_PREFIX",
    "GEOCLIP_STORE_ROOT",
    "GEOCLIP_PUBLIC_URL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
output_epsg = 3857
# Only override the output CRS
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.output_epsg.value, 3857);
    assert_eq!(config.output_epsg.source, ConfigSource::File);
    assert_eq!(config.output_prefix.value, "uploads");
    assert_eq!(config.output_prefix.source, ConfigSource::Default);
    assert_eq!(config.store_root.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("GEOCLIP_OUTPUT_EPSG", "EPSG:32748");
    env::set_var("GEOCLIP_OUTPUT_PREFIX", "env-results");
    env::set_var("GEOCLIP_PUBLIC_URL", "https://bucket.example.com");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
output_epsg = 3857
output_prefix = "file-results"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.output_epsg.value, 32748);
    assert_eq!(config.output_epsg.source, ConfigSource::Environment);
    assert_eq!(config.output_prefix.value, "env-results");
    assert_eq!(config.public_url.value.as_deref(), Some("https://bucket.example.com"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("GEOCLIP_OUTPUT_EPSG", "not-a-code");
    env::set_var("GEOCLIP_OUTPUT_PREFIX", "///");
    env::set_var("GEOCLIP_WORK_DIR", "  ");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.output_epsg.value, 4326);
    assert_eq!(config.output_epsg.source, ConfigSource::Default);
    assert_eq!(config.output_prefix.value, "uploads");
    assert_eq!(config.work_dir.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("GEOCLIP_STORE_ROOT", "/env/bucket");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "store_root = \"/file/bucket\"").unwrap();

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.store_root.value, PathBuf::from("/env/bucket"));
    assert_eq!(config.store_root.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        store_root: Some(PathBuf::from("/cli/bucket")),
        ..Default::default()
    });

    assert_eq!(config.store_root.value, PathBuf::from("/cli/bucket"));
    assert_eq!(config.store_root.source, ConfigSource::Cli);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid toml content [[[").unwrap();

    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_invalid_prefix_in_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "output_prefix = \"a/../b\"").unwrap();

    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    assert!(LayeredConfig::with_defaults().load_from_file(&non_existent).is_err());
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("geoclip.toml");
    fs::write(
        &config_path,
        r#"
work_dir = "/file/work"
output_epsg = 3857
output_prefix = "file-prefix"
"#,
    )
    .unwrap();

    env::set_var("GEOCLIP_OUTPUT_PREFIX", "env-prefix");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.work_dir.value, PathBuf::from("/file/work"));
    assert_eq!(config.output_epsg.value, 3857);
    assert_eq!(config.output_prefix.value, "env-prefix");
    assert_eq!(config.output_prefix.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        output_epsg: Some(4326),
        ..Default::default()
    });

    assert_eq!(config.output_epsg.value, 4326);
    assert_eq!(config.output_epsg.source, ConfigSource::Cli);
    assert_eq!(config.work_dir.source, ConfigSource::File);

    let inspection = config.to_inspection_map();
    assert_eq!(inspection["output_epsg"].0, "EPSG:4326");
    assert_eq!(inspection["output_prefix"].1, ConfigSource::Environment);

    clear_env();
}
