//! Configuration loading traits and types.
//!
//! Provides a standardized way to load TOML configuration files across the
//! workspace, plus the `SharedConfig` fragment every domain config embeds.
//!
//! # Usage
//!
//! ```rust,no_run
//! use racing_common::config::{ConfigLoader, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     log_level: racing_common::config::LogLevel,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = AppConfig::load(Path::new("config.toml"))?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Log level for configuration (maps onto `tracing::Level`).
///
/// Serializes to lowercase strings: "trace", "debug", "info", "warn", "error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level verbosity.
    Trace,
    /// Debug-level verbosity.
    Debug,
    /// Info-level verbosity (default).
    Info,
    /// Warning-level verbosity.
    Warn,
    /// Error-level verbosity.
    Error,
}

impl LogLevel {
    /// The `RUST_LOG` directive this level corresponds to.
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Error type for configuration loading operations.
///
/// Config/init errors are surfaced to the boot sequence (`spec.md` §7),
/// which falls back to defaults on load failure — this enum is never
/// absorbed silently the way per-tick evaluation errors are.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    /// Unknown field in TOML (strict parsing with `deny_unknown_fields`).
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The file's format-version integer is not one this build understands.
    #[error("unsupported config version in {file}: got {found}, expected {expected}")]
    UnsupportedVersion {
        /// File that carried the mismatched version.
        file: String,
        /// Version found in the file.
        found: u32,
        /// Version this build expects.
        expected: u32,
    },
}

/// Fields shared across every domain config (system, screens, channels, tracks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    pub service_name: String,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Default implementation works for any `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist.
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(format!("{}: {e}", path.display()))
            }
        })?;

        toml::from_str(&content).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("unknown field") {
                ConfigError::UnknownField(format!("{}: {msg}", path.display()))
            } else {
                ConfigError::ParseError(format!("{}: {msg}", path.display()))
            }
        })
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Reject a config file whose declared format version doesn't match.
///
/// `spec.md` §6: "Each file carries a format version integer; load must
/// reject an unknown version."
pub fn check_version(file: &str, found: u32, expected: u32) -> Result<(), ConfigError> {
    if found != expected {
        return Err(ConfigError::UnsupportedVersion {
            file: file.to_string(),
            found,
            expected,
        });
    }
    Ok(())
}
