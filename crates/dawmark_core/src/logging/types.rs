//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level debugging (very verbose).
    Trace,
    /// Debug information.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

impl LogLevel {
    /// Convert to tracing level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for the global subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Include the event target (module path).
    pub show_target: bool,
    /// Use the compact fmt layout.
    pub compact: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            show_target: true,
            compact: false,
        }
    }
}

impl LogConfig {
    /// Create a debug configuration.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            ..Self::default()
        }
    }

    /// Create a trace configuration (very verbose).
    pub fn trace() -> Self {
        Self {
            level: LogLevel::Trace,
            ..Self::default()
        }
    }
}

impl From<&crate::config::LoggingSettings> for LogConfig {
    fn from(settings: &crate::config::LoggingSettings) -> Self {
        Self {
            level: settings.level,
            ..Self::default()
        }
    }
}
