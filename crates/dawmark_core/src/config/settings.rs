//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::markers::RoundingMode;
use crate::timecode::{FrameRate, SubframesBase, UpperLimit};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Timeline interpretation.
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Whole-document extraction.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Marker export.
    #[serde(default)]
    pub export: ExportSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// How resolved times are turned into timecodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineSettings {
    /// Range after which timecode wraps.
    #[serde(default)]
    pub upper_limit: UpperLimit,

    /// Subframe divisions per frame.
    #[serde(default)]
    pub subframes_base: SubframesBase,

    /// Rate used when a document does not determine one.
    #[serde(default)]
    pub fallback_frame_rate: Option<FrameRate>,
}

/// Which story elements a batch extraction visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionScope {
    /// Every recognised story element.
    #[default]
    All,
    /// Clip kinds only.
    Clips,
    /// Markers, chapter markers, captions and keywords.
    Annotations,
    /// Markers and chapter markers.
    Markers,
}

/// Batch extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default)]
    pub scope: ExtractionScope,

    /// Visit elements that are disabled themselves or through an ancestor.
    #[serde(default)]
    pub include_disabled: bool,
}

/// Marker export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Cue length for point markers.
    #[serde(default = "default_marker_duration_ms")]
    pub marker_duration_ms: u32,

    /// Append marker comments below the name.
    #[serde(default = "default_true")]
    pub include_comments: bool,

    /// Millisecond rounding for cue times.
    #[serde(default)]
    pub rounding: RoundingMode,
}

fn default_marker_duration_ms() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            marker_duration_ms: default_marker_duration_ms(),
            include_comments: true,
            rounding: RoundingMode::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Timeline,
    Extraction,
    Export,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Timeline,
        ConfigSection::Extraction,
        ConfigSection::Export,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Timeline => "timeline",
            ConfigSection::Extraction => "extraction",
            ConfigSection::Export => "export",
            ConfigSection::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[timeline]"));
        assert!(toml.contains("[export]"));
        assert!(toml.contains("marker_duration_ms = 1000"));
        assert!(toml.contains("upper_limit = \"24h\""));
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.timeline.fallback_frame_rate = Some(FrameRate::Fps29_97Drop);
        settings.extraction.scope = ExtractionScope::Markers;
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.timeline.fallback_frame_rate, Some(FrameRate::Fps29_97Drop));
        assert_eq!(parsed.extraction.scope, ExtractionScope::Markers);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[timeline]\nupper_limit = \"100d\"\nsubframes_base = \"100\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom values preserved
        assert_eq!(parsed.timeline.upper_limit, UpperLimit::HundredDays);
        assert_eq!(parsed.timeline.subframes_base, SubframesBase::Max100);
        // Defaults applied for missing
        assert_eq!(parsed.timeline.fallback_frame_rate, None);
        assert_eq!(parsed.export.marker_duration_ms, 1000);
        assert!(parsed.export.include_comments);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn section_table_names() {
        let toml = toml::to_string_pretty(&Settings::default()).unwrap();
        for section in ConfigSection::ALL {
            assert!(toml.contains(&format!("[{}]", section.table_name())));
        }
    }
}
