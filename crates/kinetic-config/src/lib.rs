//! Kinetic configuration system
//!
//! This crate provides centralized configuration for the Kinetic tween engine,
//! loading settings from `kinetic.toml` with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "kinetic.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure for Kinetic
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KineticConfig {
    /// Tween engine limits
    pub engine: EngineConfig,
    /// Console tracer settings
    pub demo: DemoConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Tween engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of components a single tween may animate at once
    pub combined_attributes_limit: usize,
    /// Maximum number of waypoints a single tween may carry
    pub waypoints_limit: usize,
}

/// Console tracer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Time step in seconds fed to each update call
    pub step: f32,
    /// Which trace to run (tween, timeline); both when unset
    pub scene: Option<String>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string
    pub filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            combined_attributes_limit: 3,
            waypoints_limit: 0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            scene: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl KineticConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the kinetic.toml configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from the default location (kinetic.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Values that fail to parse are ignored.
    pub fn merge_with_env(&mut self) {
        if let Some(limit) = env_parse::<usize>("KINETIC_COMBINED_ATTRIBUTES_LIMIT") {
            self.engine.combined_attributes_limit = limit;
        }
        if let Some(limit) = env_parse::<usize>("KINETIC_WAYPOINTS_LIMIT") {
            self.engine.waypoints_limit = limit;
        }

        if let Some(step) = env_parse::<f32>("KINETIC_DEMO_STEP") {
            self.demo.step = step;
        }
        if let Ok(scene) = std::env::var("KINETIC_DEMO_SCENE") {
            self.demo.scene = Some(scene);
        }

        if let Ok(filter) = std::env::var("KINETIC_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// This is the recommended way to load configuration:
    /// 1. Load from kinetic.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed environment override");
            None
        }
    }
}
