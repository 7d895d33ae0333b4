//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use dawmark_core::config::{ConfigManager, ConfigSection, ExtractionScope};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/dawmark.toml");
//! config.load_or_create().unwrap();
//!
//! // Read settings
//! println!("Upper limit: {}", config.settings().timeline.upper_limit);
//!
//! // Modify a setting
//! config.settings_mut().extraction.scope = ExtractionScope::Markers;
//!
//! // Save just the extraction section atomically
//! config.update_section(ConfigSection::Extraction).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, ExportSettings, ExtractionScope, ExtractionSettings, LoggingSettings,
    Settings, TimelineSettings,
};
