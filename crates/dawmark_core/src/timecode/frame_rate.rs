//! Broadcast frame rates and timecode range properties.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rational::Fraction;

/// Known broadcast frame rates.
///
/// Drop-frame variants only exist for rates whose nominal frame count is a
/// multiple of 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRate {
    #[serde(rename = "23.976")]
    Fps23_976,
    #[serde(rename = "24")]
    Fps24,
    #[serde(rename = "24.98")]
    Fps24_98,
    #[serde(rename = "25")]
    Fps25,
    #[serde(rename = "29.97")]
    Fps29_97,
    #[serde(rename = "29.97d")]
    Fps29_97Drop,
    #[serde(rename = "30")]
    Fps30,
    #[serde(rename = "30d")]
    Fps30Drop,
    #[serde(rename = "47.952")]
    Fps47_952,
    #[serde(rename = "48")]
    Fps48,
    #[serde(rename = "50")]
    Fps50,
    #[serde(rename = "59.94")]
    Fps59_94,
    #[serde(rename = "59.94d")]
    Fps59_94Drop,
    #[serde(rename = "60")]
    Fps60,
    #[serde(rename = "60d")]
    Fps60Drop,
    #[serde(rename = "95.904")]
    Fps95_904,
    #[serde(rename = "96")]
    Fps96,
    #[serde(rename = "100")]
    Fps100,
    #[serde(rename = "119.88")]
    Fps119_88,
    #[serde(rename = "119.88d")]
    Fps119_88Drop,
    #[serde(rename = "120")]
    Fps120,
    #[serde(rename = "120d")]
    Fps120Drop,
}

/// Frame-duration lookups tolerate rounded durations such as `100/2997s`.
const FPS_TOLERANCE: f64 = 0.005;

impl FrameRate {
    /// All known rates, non-drop variants first within each family.
    pub const ALL: [FrameRate; 22] = [
        FrameRate::Fps23_976,
        FrameRate::Fps24,
        FrameRate::Fps24_98,
        FrameRate::Fps25,
        FrameRate::Fps29_97,
        FrameRate::Fps29_97Drop,
        FrameRate::Fps30,
        FrameRate::Fps30Drop,
        FrameRate::Fps47_952,
        FrameRate::Fps48,
        FrameRate::Fps50,
        FrameRate::Fps59_94,
        FrameRate::Fps59_94Drop,
        FrameRate::Fps60,
        FrameRate::Fps60Drop,
        FrameRate::Fps95_904,
        FrameRate::Fps96,
        FrameRate::Fps100,
        FrameRate::Fps119_88,
        FrameRate::Fps119_88Drop,
        FrameRate::Fps120,
        FrameRate::Fps120Drop,
    ];

    /// Frames per second as an exact fraction (`30000/1001` for 29.97).
    pub fn rate(&self) -> Fraction {
        let (num, den) = self.rate_terms();
        Fraction::new(num, den).unwrap_or(Fraction::ZERO)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration(&self) -> Fraction {
        let (num, den) = self.rate_terms();
        Fraction::new(den, num).unwrap_or(Fraction::ZERO)
    }

    /// Frames per second as a float.
    pub fn fps(&self) -> f64 {
        let (num, den) = self.rate_terms();
        num as f64 / den as f64
    }

    fn rate_terms(&self) -> (i64, i64) {
        match self {
            Self::Fps23_976 => (24_000, 1001),
            Self::Fps24 => (24, 1),
            Self::Fps24_98 => (25_000, 1001),
            Self::Fps25 => (25, 1),
            Self::Fps29_97 | Self::Fps29_97Drop => (30_000, 1001),
            Self::Fps30 | Self::Fps30Drop => (30, 1),
            Self::Fps47_952 => (48_000, 1001),
            Self::Fps48 => (48, 1),
            Self::Fps50 => (50, 1),
            Self::Fps59_94 | Self::Fps59_94Drop => (60_000, 1001),
            Self::Fps60 | Self::Fps60Drop => (60, 1),
            Self::Fps95_904 => (96_000, 1001),
            Self::Fps96 => (96, 1),
            Self::Fps100 => (100, 1),
            Self::Fps119_88 | Self::Fps119_88Drop => (120_000, 1001),
            Self::Fps120 | Self::Fps120Drop => (120, 1),
        }
    }

    /// Number of frame labels per timecode second.
    pub fn nominal_fps(&self) -> u64 {
        match self {
            Self::Fps23_976 | Self::Fps24 => 24,
            Self::Fps24_98 | Self::Fps25 => 25,
            Self::Fps29_97 | Self::Fps29_97Drop | Self::Fps30 | Self::Fps30Drop => 30,
            Self::Fps47_952 | Self::Fps48 => 48,
            Self::Fps50 => 50,
            Self::Fps59_94 | Self::Fps59_94Drop | Self::Fps60 | Self::Fps60Drop => 60,
            Self::Fps95_904 | Self::Fps96 => 96,
            Self::Fps100 => 100,
            Self::Fps119_88 | Self::Fps119_88Drop | Self::Fps120 | Self::Fps120Drop => 120,
        }
    }

    pub fn is_drop(&self) -> bool {
        self.drop_frames_per_minute() > 0
    }

    /// Frame labels skipped at the start of each minute not divisible by ten.
    pub fn drop_frames_per_minute(&self) -> u64 {
        match self {
            Self::Fps29_97Drop | Self::Fps30Drop => 2,
            Self::Fps59_94Drop | Self::Fps60Drop => 4,
            Self::Fps119_88Drop | Self::Fps120Drop => 8,
            _ => 0,
        }
    }

    /// Drop-frame counterpart, if this rate family has one.
    pub fn drop_variant(&self) -> Option<FrameRate> {
        match self {
            Self::Fps29_97 | Self::Fps29_97Drop => Some(Self::Fps29_97Drop),
            Self::Fps30 | Self::Fps30Drop => Some(Self::Fps30Drop),
            Self::Fps59_94 | Self::Fps59_94Drop => Some(Self::Fps59_94Drop),
            Self::Fps60 | Self::Fps60Drop => Some(Self::Fps60Drop),
            Self::Fps119_88 | Self::Fps119_88Drop => Some(Self::Fps119_88Drop),
            Self::Fps120 | Self::Fps120Drop => Some(Self::Fps120Drop),
            _ => None,
        }
    }

    /// Non-drop counterpart (identity for non-drop rates).
    pub fn non_drop_variant(&self) -> FrameRate {
        match self {
            Self::Fps29_97Drop => Self::Fps29_97,
            Self::Fps30Drop => Self::Fps30,
            Self::Fps59_94Drop => Self::Fps59_94,
            Self::Fps60Drop => Self::Fps60,
            Self::Fps119_88Drop => Self::Fps119_88,
            Self::Fps120Drop => Self::Fps120,
            other => *other,
        }
    }

    /// Frames (real elapsed frames) in one hour of timecode labels.
    pub fn frames_per_hour(&self) -> u64 {
        let nominal = self.nominal_fps();
        // 54 of every 60 minutes drop labels
        nominal * 3600 - self.drop_frames_per_minute() * 54
    }

    /// Frames in one 24-hour timecode day.
    pub fn frames_per_day(&self) -> u64 {
        self.frames_per_hour() * 24
    }

    /// Convert a frame duration to the nearest known rate.
    ///
    /// Durations shared by drop and non-drop variants are disambiguated with
    /// `drop_frame`; the flag is ignored for rates without a drop variant.
    pub fn from_frame_duration(frame_duration: Fraction, drop_frame: bool) -> Option<FrameRate> {
        if frame_duration.numerator() <= 0 {
            return None;
        }
        let fps = frame_duration.denominator() as f64 / frame_duration.numerator() as f64;

        let nearest = Self::ALL
            .iter()
            .filter(|rate| !rate.is_drop())
            .map(|rate| (*rate, (rate.fps() - fps).abs()))
            .filter(|(_, delta)| *delta <= FPS_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(rate, _)| rate)?;

        if drop_frame {
            match nearest.drop_variant() {
                Some(drop) => Some(drop),
                None => {
                    tracing::debug!(
                        "Drop-frame flag ignored for {} (no drop-frame variant)",
                        nearest
                    );
                    Some(nearest)
                }
            }
        } else {
            Some(nearest)
        }
    }

    /// Display string (`"29.97d"`, `"25"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fps23_976 => "23.976",
            Self::Fps24 => "24",
            Self::Fps24_98 => "24.98",
            Self::Fps25 => "25",
            Self::Fps29_97 => "29.97",
            Self::Fps29_97Drop => "29.97d",
            Self::Fps30 => "30",
            Self::Fps30Drop => "30d",
            Self::Fps47_952 => "47.952",
            Self::Fps48 => "48",
            Self::Fps50 => "50",
            Self::Fps59_94 => "59.94",
            Self::Fps59_94Drop => "59.94d",
            Self::Fps60 => "60",
            Self::Fps60Drop => "60d",
            Self::Fps95_904 => "95.904",
            Self::Fps96 => "96",
            Self::Fps100 => "100",
            Self::Fps119_88 => "119.88",
            Self::Fps119_88Drop => "119.88d",
            Self::Fps120 => "120",
            Self::Fps120Drop => "120d",
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of subframe divisions per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubframesBase {
    #[default]
    #[serde(rename = "80")]
    Max80,
    #[serde(rename = "100")]
    Max100,
}

impl SubframesBase {
    pub fn count(&self) -> u32 {
        match self {
            Self::Max80 => 80,
            Self::Max100 => 100,
        }
    }
}

/// Timecode range: wraps after 24 hours or 100 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpperLimit {
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "100d")]
    HundredDays,
}

impl UpperLimit {
    /// Number of timecode days in the range.
    pub fn days(&self) -> u64 {
        match self {
            Self::TwentyFourHours => 1,
            Self::HundredDays => 100,
        }
    }
}

impl fmt::Display for UpperLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwentyFourHours => write!(f, "24 hours"),
            Self::HundredDays => write!(f, "100 days"),
        }
    }
}

/// Everything needed to interpret a frame count as a timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimecodeProperties {
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub subframes_base: SubframesBase,
    #[serde(default)]
    pub upper_limit: UpperLimit,
}

impl TimecodeProperties {
    /// Properties with the default subframe base and a 24-hour limit.
    pub fn new(frame_rate: FrameRate) -> Self {
        Self {
            frame_rate,
            subframes_base: SubframesBase::default(),
            upper_limit: UpperLimit::default(),
        }
    }

    pub fn with_subframes_base(mut self, base: SubframesBase) -> Self {
        self.subframes_base = base;
        self
    }

    pub fn with_upper_limit(mut self, limit: UpperLimit) -> Self {
        self.upper_limit = limit;
        self
    }

    /// Total frames before the timecode wraps.
    pub fn limit_frames(&self) -> u64 {
        self.frame_rate.frames_per_day() * self.upper_limit.days()
    }

    /// Length of the full timecode range in seconds.
    pub fn limit_duration(&self) -> Fraction {
        let frames = Fraction::from_seconds(self.limit_frames() as i64);
        frames
            .checked_mul(self.frame_rate.frame_duration())
            .unwrap_or(Fraction::ZERO)
    }
}
