//! SRT marker writer.
//!
//! Writes markers as SubRip cues of a fixed length.
//!
//! # Timing Precision
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Marker times are resolved to
//! timecodes first and converted to float milliseconds, which are rounded
//! according to the configured RoundingMode at write time.

use super::ordering::ring_position;
use super::types::{DawMarker, RoundingMode};
use crate::config::ExportSettings;
use crate::timecode::{Timecode, TimecodeProperties};

/// Options for writing marker cues.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Rounding mode for time values.
    pub rounding: RoundingMode,
    /// Cue length in milliseconds.
    pub marker_duration_ms: u32,
    /// Append the comment below the marker name.
    pub include_comments: bool,
    /// Cue times are measured from this timecode around the ring.
    /// `None` measures from `00:00:00:00`.
    pub timeline_start: Option<Timecode>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::Round,
            marker_duration_ms: 1000,
            include_comments: true,
            timeline_start: None,
        }
    }
}

impl From<&ExportSettings> for WriteOptions {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            rounding: settings.rounding,
            marker_duration_ms: settings.marker_duration_ms,
            include_comments: settings.include_comments,
            timeline_start: None,
        }
    }
}

/// Write markers to an SRT string in the given order.
///
/// Markers that cannot be resolved with `properties` are skipped with a
/// warning; cue numbering stays contiguous.
pub fn write_markers_srt(
    markers: &[DawMarker],
    properties: TimecodeProperties,
    options: &WriteOptions,
) -> String {
    let mut output = String::new();
    let mut index = 0;

    for marker in markers {
        let timecode = match marker.resolve_wrapping(properties) {
            Ok(tc) => tc,
            Err(e) => {
                tracing::warn!("Skipping marker in SRT export: {}", e);
                continue;
            }
        };

        let start_seconds = match &options.timeline_start {
            Some(start) => ring_position(&timecode, start).as_seconds_f64(),
            None => timecode.real_time_seconds(),
        };
        let start_ms = start_seconds * 1000.0;
        let end_ms = start_ms + f64::from(options.marker_duration_ms);

        if index > 0 {
            output.push('\n');
        }
        index += 1;

        // Index (1-based)
        output.push_str(&format!("{}\n", index));

        let start = format_srt_time(start_ms, options.rounding);
        let end = format_srt_time(end_ms, options.rounding);
        output.push_str(&format!("{} --> {}\n", start, end));

        output.push_str(&marker.name);
        output.push('\n');
        if options.include_comments {
            if let Some(comment) = marker.comment.as_deref().filter(|c| !c.is_empty()) {
                output.push_str(comment);
                output.push('\n');
            }
        }
    }

    tracing::debug!("Wrote {} of {} markers as SRT cues", index, markers.len());
    output
}

/// Format milliseconds as SRT timestamp (HH:MM:SS,mmm).
///
/// Applies rounding mode to convert float ms to integer milliseconds.
/// Hours are not wrapped, so 100-day timelines produce hours above 99.
pub fn format_srt_time(ms: f64, rounding: RoundingMode) -> String {
    let ms = rounding.apply_srt(ms);
    let ms = ms.max(0.0) as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
