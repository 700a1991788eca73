//! YAML runtime configuration for vecpipe.
//!
//! Component files describe *what* to build. This file describes the process
//! around it: how to log and where runtime handles point.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! log_level: "info,encoder=debug"
//! json_logs: false
//! cache_dir: "/var/cache/vecpipe"
//! verbose: true
//! ```
//!
//! `VECPIPE_CACHE_DIR` and `VECPIPE_VERBOSE` still win over the file, and
//! `RUST_LOG` wins over `log_level`.

use std::fs;
use std::path::{Path, PathBuf};

use component::HandleSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that can occur when loading the runtime configuration file
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Process-level settings: logging and runtime handle locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// `EnvFilter` directives, e.g. `"info"` or `"warn,encoder=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json_logs: bool,

    /// Root for per-kind disk caches.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Per-batch debug events from encoders.
    #[serde(default)]
    pub verbose: Option<bool>,
}

impl RuntimeConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.log_level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "log_level must not be empty".into(),
            ));
        }
        EnvFilter::try_new(&self.log_level).map_err(|e| {
            ConfigLoadError::Validation(format!("log_level {:?}: {e}", self.log_level))
        })?;

        if let Some(dir) = &self.cache_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "cache_dir must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Handle settings from this file, then environment overrides.
    pub fn handle_settings(&self) -> HandleSettings {
        let mut settings = HandleSettings::default();
        if let Some(dir) = &self.cache_dir {
            settings.cache_root = dir.clone();
        }
        if let Some(verbose) = self.verbose {
            settings.verbose = verbose;
        }
        settings.apply_env()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
            json_logs: false,
            cache_dir: None,
            verbose: None,
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
