use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::paths::ProjectPaths;
use super::routine_config::RoutineConfig;
use super::scheduler_config::SchedulerConfig;

/// Starting point written by `routinely --init`
pub const EXAMPLE_CONFIG: &str = r#"# Routinely Configuration

[scheduler]
capacity = 1024
tick_interval_ms = 50
# Create routines quiet / persistent unless they say otherwise
silenced = false
persistent = false

[logging]
# Also write logs to <data dir>/logs/routinely.log
file = false

[[routines]]
tag = "heartbeat"
interval_ms = 1000
message = "still alive"

[[routines]]
tag = "countdown"
interval_ms = 250
iterations = 4
message = "countdown"
args = ["launch", 4]
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a log file next to console output
    #[serde(default)]
    pub file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutinelyConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Routines created when the host initializes
    #[serde(default)]
    pub routines: Vec<RoutineConfig>,
}

impl RoutinelyConfig {
    /// Default location of the config file
    pub fn config_path() -> PathBuf {
        ProjectPaths::new("routinely")
            .map(|p| p.config_dir())
            .unwrap_or_else(|| PathBuf::from(".routinely"))
            .join("config.toml")
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(target: "host", "Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigLoadError> {
        let io_error = |source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_error)?;
        info!(target: "host", "Saved config to {}", path.display());
        Ok(())
    }

    /// Write [`EXAMPLE_CONFIG`] to `path`, refusing to overwrite a file
    pub fn write_example(path: &Path) -> Result<(), ConfigLoadError> {
        if path.exists() {
            return Err(ConfigLoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "config file already exists",
                ),
            });
        }
        let io_error = |source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, EXAMPLE_CONFIG).map_err(io_error)?;
        info!(target: "host", "Created example config at {}", path.display());
        Ok(())
    }
}
