use crate::models::OverlayConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::fs;

/// File name of the overlay configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "overlay.yaml";

/// Prefix for environment overrides, e.g. `OVERLAY_OLLAMA__MODEL=llama3`.
pub const ENV_PREFIX: &str = "OVERLAY";

/// Configuration manager for loading and saving `overlay.yaml`.
///
/// Values are layered, later sources winning:
/// 1. built-in defaults
/// 2. `overlay.yaml` (optional)
/// 3. `OVERLAY_*` environment variables (`__` separates nested keys)
/// 4. `OLLAMA_BASE_URL` / `OLLAMA_MODEL`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
        })
    }

    /// Load the configuration using the process environment for overrides.
    pub fn load(&self) -> Result<OverlayConfig> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.load_with_env(&env)
    }

    /// Load the configuration with `env` standing in for the process environment.
    pub fn load_with_env(&self, env: &HashMap<String, String>) -> Result<OverlayConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let layered = Config::builder()
            .add_source(
                File::from(self.config_path.as_std_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(
                        env.iter()
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect(),
                    )),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let mut config: OverlayConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        if let Some(base_url) = env.get("OLLAMA_BASE_URL").filter(|v| !v.is_empty()) {
            config.ollama.base_url = base_url.clone();
        }
        if let Some(model) = env.get("OLLAMA_MODEL").filter(|v| !v.is_empty()) {
            config.ollama.model = model.clone();
        }

        tracing::info!(
            "Loaded config: ollama={}, model={}",
            config.ollama.base_url,
            config.ollama.model
        );
        Ok(config)
    }

    /// Save the configuration file.
    pub fn save(&self, config: &OverlayConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
