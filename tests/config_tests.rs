use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tradestate::error::{ConfigError, Error};
use tradestate::infrastructure::bootstrap::StateLayer;
use tradestate::infrastructure::config::settings::Config;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn example_config_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))
        .expect("example config is valid");

    assert_eq!(config.tracker.default_timeout_secs, 180);
    assert_eq!(config.positions.ttl_secs, 604_800);
}

#[test]
fn config_rejects_zero_health_interval() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[positions]
health_check_interval_secs = 0
"#,
    );

    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "health_check_interval_secs",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid interval error, got {err}"),
        Ok(_) => panic!("Expected invalid interval error, got Ok"),
    }
}

#[test]
fn config_rejects_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[tracker\ncheck_interval_secs = 5");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        Config::load(dir.path().join("absent.toml")),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[tokio::test]
async fn config_without_store_builds_memory_layer() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[store]
key_prefix = "bot"

[tracker]
default_timeout_secs = 60
check_interval_secs = 5
"#,
    );
    let mut config = Config::load(&path).unwrap();
    config.store.url = None;

    let layer = StateLayer::build(&config).await.unwrap();

    assert_eq!(layer.tracker().timeout_secs(), 60);
    assert_eq!(layer.tracker().settings().check_interval.as_secs(), 5);
    assert_eq!(layer.positions().stats().backend, "none");
}
