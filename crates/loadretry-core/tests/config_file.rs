//! Config file creation and loading at an explicit path.

use loadretry_core::config::{self, LoadRetryConfig};
use tempfile::tempdir;

#[test]
fn missing_file_is_created_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = config::load_or_init_at(&path).unwrap();

    assert_eq!(cfg, LoadRetryConfig::default());
    assert!(path.exists());
    let reloaded = config::load_from(&path).unwrap();
    assert_eq!(reloaded, cfg);
}

#[test]
fn existing_file_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retry]\nmin_retry_count = 6\nconnectivity_ceiling = 60\n").unwrap();

    let cfg = config::load_or_init_at(&path).unwrap();

    assert_eq!(cfg.retry.min_retry_count, 6);
    assert_eq!(cfg.retry.connectivity_ceiling, Some(60));
    assert_eq!(cfg.fetch.timeout_secs, 30);
}

#[test]
fn invalid_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retry]\nmin_retry_count = \"many\"\n").unwrap();

    let err = config::load_from(&path).unwrap_err();

    assert!(format!("{err:#}").contains("config.toml"));
}
