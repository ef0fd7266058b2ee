//! Layered application configuration
//!
//! Sources, lowest priority first:
//! - built-in defaults
//! - TOML file (`sleepy-check.toml` in the working directory, or an explicit path)
//! - environment variables, e.g. `SLEEPY__DETECTION__WINDOW_SECONDS=30`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment, File};
use drowsiness::{DrowsinessConfig, DrowsinessError, ModelConfig};
use game_launcher::LauncherConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

const DEFAULT_CONFIG_NAME: &str = "sleepy-check";
const ENV_PREFIX: &str = "SLEEPY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DrowsinessError),

    #[error("Invalid log level: {0}")]
    LogLevel(String),

    #[error("Invalid launcher settings: {0}")]
    Launcher(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DrowsinessConfig,
    pub model: ModelConfig,
    pub camera: CameraSettings,
    pub launcher: LauncherConfig,
    pub logging: LoggingConfig,
}

/// Frame source settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Directory of frames to replay as the camera feed
    pub frames_dir: Option<PathBuf>,
    /// Restart the sequence after the last frame
    pub looping: bool,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level, SettingsError> {
        Level::from_str(&self.level).map_err(|_| SettingsError::LogLevel(self.level.clone()))
    }
}

impl AppConfig {
    /// Load from defaults, the config file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::from_sources(path, environment())
    }

    /// Load with an explicit environment source
    pub fn from_sources(path: Option<&Path>, env: Environment) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.detection.validate()?;
        self.model.validate()?;
        self.logging.max_level()?;
        if !(self.launcher.timeout_seconds.is_finite() && self.launcher.timeout_seconds > 0.0) {
            return Err(SettingsError::Launcher(format!(
                "timeout_seconds must be positive, got {}",
                self.launcher.timeout_seconds
            )));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
