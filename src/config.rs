use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::HomeInstitution;
use crate::ocr::OcrConfig;

pub const DEFAULT_CONFIG_FILE: &str = "surat.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub id: String,
    pub home: HomeInstitution,
    pub ocr: OcrConfig,
    pub classifier: ClassifierConfig,
    pub storage: StorageConfig,
    pub inputs: InputsConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "surat-extract".into(),
            home: HomeInstitution::default(),
            ocr: OcrConfig::default(),
            classifier: ClassifierConfig::default(),
            storage: StorageConfig::default(),
            inputs: InputsConfig::default(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inject the built-in indicator model as the cascade's last resort.
    pub indicator_model: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { indicator_model: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: "./arsip".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub path: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self { path: "./input/**/*.pdf".into() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Read and validate a YAML config file. Missing sections take their defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let config: Config = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// `load_config` when the file exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            load_config(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Invalid("missing id".into()));
        }
        if self.home.name.trim().is_empty() {
            return Err(ConfigError::Invalid("missing home.name".into()));
        }
        if self.ocr.dpi == 0 {
            return Err(ConfigError::Invalid("ocr.dpi must be positive".into()));
        }
        if self.ocr.contrast <= 0.0 || self.ocr.sharpness <= 0.0 {
            return Err(ConfigError::Invalid("ocr.contrast and ocr.sharpness must be positive".into()));
        }
        Ok(())
    }
}
