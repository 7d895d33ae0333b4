//! Format-independent markers.
//!
//! # Features
//!
//! - **Model**: `DawMarker` with real-time, timecode-label, or rational storage
//! - **Ordering**: ring-based comparison and sorting for timelines that do
//!   not start at `00:00:00:00`
//! - **Export**: SubRip cues for marker review
//!
//! # Usage
//!
//! ```
//! use dawmark_core::markers::{sort_markers, DawMarker, MarkerTime};
//! use dawmark_core::timecode::{Fraction, FrameRate, Timecode, TimecodeProperties};
//!
//! let props = TimecodeProperties::new(FrameRate::Fps24);
//! let start = Timecode::parse("20:00:00:00", props).unwrap();
//! let mut markers = vec![
//!     DawMarker::new(MarkerTime::rational(Fraction::from_seconds(0)), "Midnight"),
//!     DawMarker::new(MarkerTime::rational(Fraction::from_seconds(75_600)), "21h"),
//! ];
//! sort_markers(&mut markers, props, &start);
//! assert_eq!(markers[0].name, "21h");
//! ```

mod ordering;
mod srt;
mod types;

// Re-export types
pub use types::{DawMarker, MarkerError, MarkerResult, MarkerTime, RoundingMode};

// Re-export functions
pub use ordering::{
    compare_wrapping, is_sorted_wrapping, markers_are_sorted, ring_position, sort_markers,
    sort_wrapping,
};
pub use srt::{format_srt_time, write_markers_srt, WriteOptions};
