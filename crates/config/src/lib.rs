//! Configuration loading, validation, and management for spoolctl.
//!
//! Loads configuration from `~/.spoolctl/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.spoolctl/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Spoolman instance (e.g. `http://spoolman.local:7912`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Central directory holding plan files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plans_dir: Option<PathBuf>,

    /// Directory holding paused plan files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_dir: Option<PathBuf>,

    /// Directory holding finished plan files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Short names for locations, e.g. `A = "AMS A"`. Typed text is upper-cased
    /// before lookup, so keys should be upper case.
    #[serde(default)]
    pub location_aliases: HashMap<String, String>,

    /// Printer name → the locations (slots) that belong to it, in slot order
    #[serde(default)]
    pub printers: BTreeMap<String, Vec<String>>,

    /// How many spools a location holds at once; unlisted locations hold 1
    #[serde(default)]
    pub location_capacity: HashMap<String, u32>,

    /// Per-filament low-stock thresholds in grams, keyed by `name` or `vendor::name`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub low_thresholds: BTreeMap<String, f64>,

    /// Filaments the low-stock report skips (`name` or `vendor::name` patterns)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub low_ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Capacity assumed for a location without a declared capacity.
pub const DEFAULT_CAPACITY: u32 = 1;

impl AppConfig {
    /// Load configuration from the default path (~/.spoolctl/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SPOOLCTL_API_BASE`
    /// - `SPOOLCTL_PLANS_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(api_base) = std::env::var("SPOOLCTL_API_BASE") {
            config.api_base = Some(api_base);
        }

        if let Ok(plans_dir) = std::env::var("SPOOLCTL_PLANS_DIR") {
            config.plans_dir = Some(PathBuf::from(plans_dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".spoolctl")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "api_base must start with http:// or https:// (got {base:?})"
                )));
            }
        }

        if let Some((pattern, _)) = self
            .low_thresholds
            .iter()
            .find(|(_, grams)| !grams.is_finite() || **grams < 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "low_thresholds for {pattern:?} must be a non-negative number of grams"
            )));
        }

        if let Some((loc, _)) = self.location_capacity.iter().find(|(_, c)| **c == 0) {
            return Err(ConfigError::ValidationError(format!(
                "location_capacity for {loc:?} must be at least 1"
            )));
        }

        let mut owner: HashMap<&str, &str> = HashMap::new();
        for (printer, slots) in &self.printers {
            for slot in slots {
                if let Some(other) = owner.insert(slot.as_str(), printer.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "location {slot:?} is assigned to both {other:?} and {printer:?}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// The API base URL, or an error naming the missing setting.
    pub fn require_api_base(&self) -> Result<&str, ConfigError> {
        self.api_base
            .as_deref()
            .ok_or_else(|| ConfigError::ValidationError("api_base not configured".into()))
    }

    /// Declared capacity of a location, defaulting to 1.
    pub fn capacity(&self, location: &str) -> u32 {
        self.location_capacity
            .get(location)
            .copied()
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Generate a starter config TOML string.
    pub fn default_toml() -> String {
        let mut config = Self {
            api_base: Some("http://localhost:7912".into()),
            ..Self::default()
        };
        config
            .location_aliases
            .insert("A".into(), "AMS A".into());
        config
            .printers
            .insert("Printer".into(), vec!["AMS A".into()]);
        config.location_capacity.insert("AMS A".into(), 4);
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
