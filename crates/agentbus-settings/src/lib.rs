//! AgentBus Settings Crate
//!
//! Loads, validates and saves the settings file that configures the event
//! bus and logging.

pub mod config;
pub mod error;

pub use config::{LoggingSettings, Settings, LOG_LEVELS, MAX_HISTORY_RETENTION_SECS};
pub use error::{Result, SettingsError};
