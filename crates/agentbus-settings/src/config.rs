//! Settings file handling for AgentBus
//!
//! Settings are stored as JSON or TOML, chosen by file extension, and are
//! organized into sections:
//! - `bus`: event bus behaviour (failure policy, queue limit, delivery log)
//! - `logging`: log level and output format

use agentbus_core::EventBusConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SettingsError};

/// Longest delivery log retention accepted in `bus.history_retention_secs` (100 years).
pub const MAX_HISTORY_RETENTION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Log levels accepted in `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Include thread ids in log lines
    pub thread_ids: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            thread_ids: true,
        }
    }
}

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Event bus behaviour
    pub bus: EventBusConfig,
    /// Logging preferences
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings location: `<config dir>/agentbus/settings.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("agentbus").join("settings.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;

        let settings: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from file, or use defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save settings to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let format = Format::of(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.bus.max_pending_events == 0 {
            return Err(SettingsError::invalid(
                "bus.max_pending_events",
                "must be > 0",
            ));
        }

        if self.bus.enable_history {
            if self.bus.max_history_size == 0 {
                return Err(SettingsError::invalid(
                    "bus.max_history_size",
                    "must be > 0 when history is enabled",
                ));
            }
            if self.bus.history_retention_secs == 0 {
                return Err(SettingsError::invalid(
                    "bus.history_retention_secs",
                    "must be > 0 when history is enabled",
                ));
            }
            if self.bus.history_retention_secs > MAX_HISTORY_RETENTION_SECS {
                return Err(SettingsError::invalid(
                    "bus.history_retention_secs",
                    format!("must be at most {}", MAX_HISTORY_RETENTION_SECS),
                ));
            }
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(SettingsError::invalid(
                "logging.level",
                format!(
                    "unknown level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Bus configuration described by these settings
    pub fn bus_config(&self) -> EventBusConfig {
        self.bus.clone()
    }
}
