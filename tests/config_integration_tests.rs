//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration when the file is missing or partial
//! - `OVERLAY_*` overrides with `__` between nested keys
//! - Legacy `OLLAMA_*` overrides
//! - Invalid file handling
//! - Integration with the health check client

use camino::Utf8PathBuf;
use ittai_overlay::models::OllamaSettings;
use ittai_overlay::services::OllamaHealthCheck;
use ittai_overlay::{ConfigManager, OverlayConfig};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_path().as_str(), config_path.join("overlay.yaml").as_str());
}

#[test]
fn test_config_directory_creation() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("a").join("b");

    assert!(!nested.exists());
    ConfigManager::new(&nested).unwrap();
    assert!(nested.exists());
}

#[test]
fn test_load_default_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_with_env(&no_env()).unwrap();

    assert_eq!(config.ollama.base_url, "http://localhost:11434");
    assert_eq!(config.ollama.model, "qwen2.5:1.5b");
    assert_eq!(config.ollama.request_timeout_secs, 3);
    assert_eq!(config.logging.directory, "logs");
    assert!(!config.logging.debug);
    assert!(config.logging.console);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.config_path(), "logging:\n  debug: true\n").unwrap();

    let config = manager.load_with_env(&no_env()).unwrap();

    assert!(config.logging.debug);
    assert!(config.logging.console);
    assert_eq!(config.ollama, OllamaSettings::default());
}

#[test]
fn test_save_and_load_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = OverlayConfig::default();
    config.ollama.base_url = "http://127.0.0.1:9000".to_string();
    config.ollama.model = "llama3".to_string();
    config.ollama.request_timeout_secs = 10;
    config.logging.console = false;

    manager.save(&config).unwrap();
    assert!(manager.config_path().exists());

    let loaded = manager.load_with_env(&no_env()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_legacy_env_overrides_saved_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = OverlayConfig::default();
    config.ollama.base_url = "http://127.0.0.1:9000".to_string();
    manager.save(&config).unwrap();

    let loaded = manager
        .load_with_env(&env(&[
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "qwen2.5:7b"),
        ]))
        .unwrap();

    assert_eq!(loaded.ollama.base_url, "http://gpu-box:11434");
    assert_eq!(loaded.ollama.model, "qwen2.5:7b");
}

#[test]
fn test_prefixed_env_overrides_nested_keys() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.config_path(),
        "ollama:\n  model: llama3\n  request_timeout_secs: 5\nlogging:\n  debug: false\n",
    )
    .unwrap();

    let config = manager
        .load_with_env(&env(&[
            ("OVERLAY_OLLAMA__MODEL", "gemma2:2b"),
            ("OVERLAY_OLLAMA__REQUEST_TIMEOUT_SECS", "7"),
            ("OVERLAY_LOGGING__DEBUG", "true"),
        ]))
        .unwrap();

    assert_eq!(config.ollama.model, "gemma2:2b");
    assert_eq!(config.ollama.request_timeout_secs, 7);
    assert!(config.logging.debug);
    assert_eq!(config.ollama.base_url, "http://localhost:11434");
}

#[test]
fn test_legacy_env_beats_prefixed_env() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager
        .load_with_env(&env(&[
            ("OVERLAY_OLLAMA__MODEL", "gemma2:2b"),
            ("OLLAMA_MODEL", "qwen2.5:7b"),
        ]))
        .unwrap();

    assert_eq!(config.ollama.model, "qwen2.5:7b");
}

#[test]
fn test_invalid_yaml_handling() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.config_path(), "invalid: yaml: content: {{").unwrap();

    assert!(manager.load_with_env(&no_env()).is_err());
}

#[test]
fn test_wrong_value_type_is_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.config_path(),
        "ollama:\n  request_timeout_secs: soon\n",
    )
    .unwrap();

    assert!(manager.load_with_env(&no_env()).is_err());
}

#[test]
fn test_config_integration_with_health_check() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.config_path(),
        "ollama:\n  base_url: http://127.0.0.1:1\n  request_timeout_secs: 1\n",
    )
    .unwrap();

    let config = manager.load_with_env(&no_env()).unwrap();

    assert!(OllamaHealthCheck::new(&config.ollama).is_ok());
}
