//! Wraparound ordering.
//!
//! A timeline that starts at an arbitrary timecode is a ring whose length is
//! the upper limit and whose zero is the timeline start. Values just before
//! the start are the latest on the ring.

use std::cmp::Ordering;

use super::types::DawMarker;
use crate::timecode::{Fraction, Timecode, TimecodeProperties};

/// Distance from `timeline_start` to `value` going forward around the ring.
///
/// The ring length is the timeline start's upper limit.
pub fn ring_position(value: &Timecode, timeline_start: &Timecode) -> Fraction {
    let limit = timeline_start.properties().limit_duration();
    value
        .to_rational()
        .checked_sub(timeline_start.to_rational())
        .and_then(|delta| delta.rem_euclid(limit))
        .unwrap_or(Fraction::ZERO)
}

/// Compare two timecodes on a ring starting at `timeline_start`.
pub fn compare_wrapping(a: &Timecode, b: &Timecode, timeline_start: &Timecode) -> Ordering {
    ring_position(a, timeline_start).cmp(&ring_position(b, timeline_start))
}

/// True when `values` never decrease around the ring. Equal runs are allowed.
pub fn is_sorted_wrapping(values: &[Timecode], timeline_start: &Timecode) -> bool {
    values
        .windows(2)
        .all(|pair| compare_wrapping(&pair[0], &pair[1], timeline_start) != Ordering::Greater)
}

/// Stable sort around the ring.
pub fn sort_wrapping(values: &mut [Timecode], timeline_start: &Timecode) {
    values.sort_by_cached_key(|v| ring_position(v, timeline_start));
}

/// Ring position of a marker, or `None` if it cannot be resolved.
fn marker_key(
    marker: &DawMarker,
    properties: TimecodeProperties,
    timeline_start: &Timecode,
) -> Option<Fraction> {
    match marker.resolve_wrapping(properties) {
        Ok(timecode) => Some(ring_position(&timecode, timeline_start)),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// Stable sort of markers around the ring; unresolvable markers go last.
pub fn sort_markers(
    markers: &mut [DawMarker],
    properties: TimecodeProperties,
    timeline_start: &Timecode,
) {
    markers.sort_by_cached_key(|m| {
        let key = marker_key(m, properties, timeline_start);
        (key.is_none(), key)
    });
}

/// True when `markers` are in ring order with unresolvable markers last.
pub fn markers_are_sorted(
    markers: &[DawMarker],
    properties: TimecodeProperties,
    timeline_start: &Timecode,
) -> bool {
    let keys: Vec<_> = markers
        .iter()
        .map(|m| {
            let key = marker_key(m, properties, timeline_start);
            (key.is_none(), key)
        })
        .collect();
    keys.windows(2).all(|pair| pair[0] <= pair[1])
}
