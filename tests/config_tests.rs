// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use gesture_booth::BoothConfig;
use gesture_booth::BoothError;

#[test]
fn test_config_default() {
    let config = BoothConfig::default();

    assert!(config.mirror_preview, "Mirror preview should be enabled by default");
    assert_eq!(config.required_hold_ms, 1400);
    assert_eq!(config.cooldown_seconds, 3);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_upload_url() {
    let config = BoothConfig::default();
    assert!(
        config.upload_url.starts_with("https://"),
        "Upload URL should be HTTPS"
    );
}

#[test]
fn test_config_save_and_load() {
    let path = std::env::temp_dir()
        .join(format!("gesture-booth-config-{}", std::process::id()))
        .join("config.json");

    let mut config = BoothConfig::default();
    config.cooldown_seconds = 5;
    config.hold_grace_ms = 120;
    config.save(&path).unwrap();

    let loaded = BoothConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let missing = std::path::Path::new("/nonexistent/gesture-booth/config.json");
    assert!(matches!(
        BoothConfig::load_or_default(Some(missing)),
        Err(BoothError::Storage(_))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = BoothConfig::default();
    config.sample_interval_ms = 0;
    assert!(matches!(config.validate(), Err(BoothError::Config(_))));
}

#[test]
fn test_zero_cooldown_rejected() {
    let mut config = BoothConfig::default();
    config.cooldown_seconds = 0;
    assert!(matches!(config.validate(), Err(BoothError::Config(_))));

    config.cooldown_seconds = 1;
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_cooldown_file_is_refused_at_load() {
    let dir = std::env::temp_dir().join(format!("gesture-booth-cooldown-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "cooldown_seconds": 0 }"#).unwrap();

    let result = BoothConfig::load(&path);
    assert!(matches!(result, Err(BoothError::Config(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
