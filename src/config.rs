// src/config.rs

//! Static configuration for the storefront engine
//!
//! Configuration is loaded once at startup from a YAML, JSON or TOML file
//! (format detected by extension), with a small set of environment
//! overrides. Every section has sensible defaults so an empty or absent
//! file yields a working engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub checkout: CheckoutConfig,
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: None,
        }
    }
}

impl StorageConfig {
    /// Directory the file backend persists under: the configured path, or a
    /// per-user data directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("data"))
            .join("shoplite")
            .join("storage")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Simulated payment-processing delay awaited before an order is written.
    pub processing_delay_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Write the demo catalog and demo accounts when their keys are absent.
    pub demo_data: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { demo_data: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub console: ConsoleLogConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileLogConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            console: ConsoleLogConfig::default(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleLogConfig {
    pub enabled: bool,
    pub colored: bool,
}

impl Default for ConsoleLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLogConfig {
    pub path: PathBuf,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/shoplite.log"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, applying environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported configuration format: {}",
                path.display()
            ))
        })?;

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e)).caused_by(e)
        })?;

        let mut config: AppConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&raw)
                .map_err(|e| Error::config(format!("Invalid YAML configuration: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(&raw)
                .map_err(|e| Error::config(format!("Invalid JSON configuration: {}", e)))?,
            ConfigFormat::Toml => toml::from_str(&raw)
                .map_err(|e| Error::config(format!("Invalid TOML configuration: {}", e)))?,
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SHOPLITE_LOG") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(dir) = std::env::var("SHOPLITE_DATA_DIR") {
            if !dir.is_empty() {
                self.storage.path = Some(PathBuf::from(dir));
            }
        }
    }
}
