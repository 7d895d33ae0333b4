//! Format-independent marker types.

use serde::{Deserialize, Serialize};

use crate::timecode::{
    Fraction, FrameRate, SubframesBase, Timecode, TimecodeError, TimecodeProperties, UpperLimit,
};

/// Errors that can occur while resolving markers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerError {
    /// The marker's stored time cannot be converted to a timecode.
    #[error("Marker '{name}' cannot be resolved: {source}")]
    Unresolvable {
        name: String,
        #[source]
        source: TimecodeError,
    },
}

impl MarkerError {
    pub fn unresolvable(name: impl Into<String>, source: TimecodeError) -> Self {
        Self::Unresolvable {
            name: name.into(),
            source,
        }
    }
}

/// Type alias for marker operation results.
pub type MarkerResult<T> = Result<T, MarkerError>;

/// Elapsed time since the originating timeline's zero.
///
/// Each encoding is interpreted in its own frame rate and base; resolving to
/// a `Timecode` needs target properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerTime {
    /// Floating-point seconds.
    RealTime { seconds: f64 },
    /// A timecode label with the rate it was written at.
    TimecodeString {
        value: String,
        frame_rate: FrameRate,
        #[serde(default)]
        subframes_base: SubframesBase,
    },
    /// Exact rational seconds.
    Rational { seconds: Fraction },
}

impl MarkerTime {
    pub fn rational(seconds: Fraction) -> Self {
        Self::Rational { seconds }
    }

    /// Elapsed seconds as an exact fraction.
    pub fn elapsed(&self) -> Result<Fraction, TimecodeError> {
        match self {
            Self::RealTime { seconds } => {
                Fraction::from_seconds_f64(*seconds).ok_or(TimecodeError::NonFinite)
            }
            Self::TimecodeString {
                value,
                frame_rate,
                subframes_base,
            } => {
                // Labels may carry a day component
                let properties = TimecodeProperties::new(*frame_rate)
                    .with_subframes_base(*subframes_base)
                    .with_upper_limit(UpperLimit::HundredDays);
                Ok(Timecode::parse(value, properties)?.to_rational())
            }
            Self::Rational { seconds } => Ok(*seconds),
        }
    }
}

/// A named point on a timeline, independent of any interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DawMarker {
    pub time: MarkerTime,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DawMarker {
    pub fn new(time: MarkerTime, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Resolve to a timecode with the given properties.
    ///
    /// Fails when the stored time is malformed or outside the target range.
    pub fn resolve(&self, properties: TimecodeProperties) -> MarkerResult<Timecode> {
        self.time
            .elapsed()
            .and_then(|seconds| Timecode::from_rational(seconds, properties))
            .map_err(|e| MarkerError::unresolvable(&self.name, e))
    }

    /// Resolve to a timecode, wrapping values outside the target range.
    pub fn resolve_wrapping(&self, properties: TimecodeProperties) -> MarkerResult<Timecode> {
        self.time
            .elapsed()
            .and_then(|seconds| Timecode::from_rational_wrapping(seconds, properties))
            .map_err(|e| MarkerError::unresolvable(&self.name, e))
    }
}

/// Rounding mode for time values when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Round down (floor).
    Floor,
    /// Round to nearest.
    #[default]
    Round,
    /// Round up (ceil).
    Ceil,
}

impl RoundingMode {
    /// Apply rounding for SRT (millisecond precision).
    pub fn apply_srt(&self, ms: f64) -> f64 {
        match self {
            Self::Floor => ms.floor(),
            Self::Round => ms.round(),
            Self::Ceil => ms.ceil(),
        }
    }
}
