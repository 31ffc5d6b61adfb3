//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VHL_CONFIG`)
//! 3. Per-user config file (`<config_dir>/vhl/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error: the loader warns and falls back to
//! compiled defaults. A config file that exists but fails to parse is.

use crate::{Error, FadeCurve, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VHL_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[playback]` section: crossfade and seek timing
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// Seconds before a clip boundary where the fade-out begins
    #[serde(default = "default_fade_out_window_secs")]
    pub fade_out_window_secs: f64,

    /// Volume added per fade-in tick
    #[serde(default = "default_fade_in_step")]
    pub fade_in_step: f64,

    /// Interval between fade-in ticks
    #[serde(default = "default_fade_in_tick_ms")]
    pub fade_in_tick_ms: u64,

    /// Delay between the seek and the first fade-in tick
    #[serde(default = "default_fade_in_delay_ms")]
    pub fade_in_delay_ms: u64,

    #[serde(default)]
    pub fade_curve: FadeCurve,

    /// How long a seek request stays visible before auto-clearing
    #[serde(default = "default_seek_request_window_ms")]
    pub seek_request_window_ms: u64,
}

/// `[project]` section: persistence
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Debounce delay between the last selection change and auto-save
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    /// Project file used by the JSON file store
    #[serde(default)]
    pub project_path: Option<PathBuf>,
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_fade_out_window_secs() -> f64 {
    0.3
}

fn default_fade_in_step() -> f64 {
    0.1
}

fn default_fade_in_tick_ms() -> u64 {
    30
}

fn default_fade_in_delay_ms() -> u64 {
    50
}

fn default_seek_request_window_ms() -> u64 {
    50
}

fn default_autosave_delay_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fade_out_window_secs: default_fade_out_window_secs(),
            fade_in_step: default_fade_in_step(),
            fade_in_tick_ms: default_fade_in_tick_ms(),
            fade_in_delay_ms: default_fade_in_delay_ms(),
            fade_curve: FadeCurve::default(),
            seek_request_window_ms: default_seek_request_window_ms(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
            project_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from an explicit file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration, falling back to compiled defaults
    ///
    /// An explicit path (CLI or environment) that does not exist is reported
    /// as a configuration error; an absent per-user file is not.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            ConfigSource::Explicit(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            ConfigSource::UserDefault(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            ConfigSource::UserDefault(path) => {
                warn!(
                    "No config file at {}, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            ConfigSource::Defaults => {
                warn!("Could not determine config directory, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Where the configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// CLI argument or environment variable
    Explicit(PathBuf),
    /// Platform per-user config file (may not exist)
    UserDefault(PathBuf),
    /// No config directory on this platform
    Defaults,
}

/// Resolve the config file location by priority
pub fn resolve_config_path(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    match dirs::config_dir() {
        Some(dir) => ConfigSource::UserDefault(dir.join("vhl").join("config.toml")),
        None => ConfigSource::Defaults,
    }
}

/// Default location for the project file when none is configured
pub fn default_project_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vhl").join("video-highlight-project.json"))
        .unwrap_or_else(|| PathBuf::from("./video-highlight-project.json"))
}
