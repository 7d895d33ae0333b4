//! Timecode values and the rational-time codec.
//!
//! A `Timecode` is a real elapsed frame count plus subframes, interpreted
//! through `TimecodeProperties`. Drop-frame labels are derived on display;
//! the stored frame count is never a label.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{TimecodeError, TimecodeResult};
use super::frame_rate::{FrameRate, TimecodeProperties};
use super::rational::Fraction;

/// Labelled timecode components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Components {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub frames: u64,
    pub subframes: u32,
}

impl Components {
    pub fn new(hours: u64, minutes: u64, seconds: u64, frames: u64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            frames,
            ..Default::default()
        }
    }

    pub fn with_days(mut self, days: u64) -> Self {
        self.days = days;
        self
    }

    pub fn with_subframes(mut self, subframes: u32) -> Self {
        self.subframes = subframes;
        self
    }
}

/// A position on a wrapping timeline.
///
/// Invariant: `frames < properties.limit_frames()` and
/// `subframes < properties.subframes_base.count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timecode {
    frames: u64,
    subframes: u32,
    properties: TimecodeProperties,
}

impl Timecode {
    /// `00:00:00:00` with the given properties.
    pub fn zero(properties: TimecodeProperties) -> Self {
        Self {
            frames: 0,
            subframes: 0,
            properties,
        }
    }

    /// Build from a real elapsed frame count.
    pub fn from_frames(
        frames: u64,
        subframes: u32,
        properties: TimecodeProperties,
    ) -> TimecodeResult<Self> {
        let limit = properties.limit_frames();
        if frames >= limit {
            return Err(TimecodeError::out_of_range(
                format!("{} frames", frames),
                format!("{} frames", limit),
            ));
        }
        if subframes >= properties.subframes_base.count() {
            return Err(TimecodeError::invalid_component(
                "subframes",
                subframes as u64,
            ));
        }
        Ok(Self {
            frames,
            subframes,
            properties,
        })
    }

    /// Build from labelled components, validating each against the rate.
    pub fn from_components(
        components: Components,
        properties: TimecodeProperties,
    ) -> TimecodeResult<Self> {
        let rate = properties.frame_rate;
        let nominal = rate.nominal_fps();

        if components.days >= properties.upper_limit.days() {
            return Err(TimecodeError::invalid_component("days", components.days));
        }
        if components.hours >= 24 {
            return Err(TimecodeError::invalid_component("hours", components.hours));
        }
        if components.minutes >= 60 {
            return Err(TimecodeError::invalid_component(
                "minutes",
                components.minutes,
            ));
        }
        if components.seconds >= 60 {
            return Err(TimecodeError::invalid_component(
                "seconds",
                components.seconds,
            ));
        }
        if components.frames >= nominal {
            return Err(TimecodeError::invalid_component("frames", components.frames));
        }

        let drop = rate.drop_frames_per_minute();
        if drop > 0
            && components.seconds == 0
            && components.minutes % 10 != 0
            && components.frames < drop
        {
            // Dropped label, e.g. 00:01:00;00 at 29.97d
            return Err(TimecodeError::invalid_component("frames", components.frames));
        }

        let label = ((components.hours * 3600 + components.minutes * 60 + components.seconds)
            * nominal)
            + components.frames;
        let total_minutes = components.hours * 60 + components.minutes;
        let frames_in_day = label - drop * (total_minutes - total_minutes / 10);

        Self::from_frames(
            components.days * rate.frames_per_day() + frames_in_day,
            components.subframes,
            properties,
        )
    }

    /// Decode a rational time string (`"3600/25s"`) into a timecode.
    ///
    /// Fails for malformed strings, zero denominators, and values outside
    /// `0..upper limit`.
    pub fn from_time_string(value: &str, properties: TimecodeProperties) -> TimecodeResult<Self> {
        let fraction: Fraction = value.parse()?;
        Self::from_rational(fraction, properties)
    }

    /// Convert elapsed seconds into a timecode without wrapping.
    pub fn from_rational(seconds: Fraction, properties: TimecodeProperties) -> TimecodeResult<Self> {
        if seconds.is_negative() {
            return Err(TimecodeError::out_of_range(
                seconds,
                properties.limit_duration(),
            ));
        }
        let (frames, subframes) = split_frames(seconds, &properties)?;
        if frames >= properties.limit_frames() {
            return Err(TimecodeError::out_of_range(
                seconds,
                properties.limit_duration(),
            ));
        }
        Ok(Self {
            frames,
            subframes,
            properties,
        })
    }

    /// Convert elapsed seconds into a timecode, wrapping around the upper
    /// limit in both directions.
    pub fn from_rational_wrapping(
        seconds: Fraction,
        properties: TimecodeProperties,
    ) -> TimecodeResult<Self> {
        let wrapped = seconds
            .rem_euclid(properties.limit_duration())
            .ok_or(TimecodeError::Overflow)?;
        Self::from_rational(wrapped, properties)
    }

    /// Convert floating-point elapsed seconds into a timecode.
    pub fn from_real_time(seconds: f64, properties: TimecodeProperties) -> TimecodeResult<Self> {
        let fraction = Fraction::from_seconds_f64(seconds).ok_or(TimecodeError::NonFinite)?;
        Self::from_rational(fraction, properties)
    }

    /// Parse a timecode label such as `01:00:00:00`, `00:59:59;29`,
    /// `1 00:00:00:00` or `01:00:00:00.40`.
    pub fn parse(value: &str, properties: TimecodeProperties) -> TimecodeResult<Self> {
        let components = parse_components(value)
            .ok_or_else(|| TimecodeError::MalformedTimecode(value.to_string()))?;
        Self::from_components(components, properties)
    }

    /// Elapsed seconds since `00:00:00:00`, exact.
    pub fn to_rational(&self) -> Fraction {
        let base = self.properties.subframes_base.count() as i128;
        let rate = self.properties.frame_rate.rate();
        let subframe_units = self.frames as i128 * base + self.subframes as i128;
        let numerator = subframe_units * rate.denominator() as i128;
        let denominator = base * rate.numerator() as i128;
        Fraction::from_wide(numerator, denominator).unwrap_or(Fraction::ZERO)
    }

    /// Encode as a rational time string (`"3600s"`, `"1001/30000s"`).
    pub fn to_time_string(&self) -> String {
        self.to_rational().to_string()
    }

    /// Elapsed seconds as a float.
    pub fn real_time_seconds(&self) -> f64 {
        self.to_rational().as_seconds_f64()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn subframes(&self) -> u32 {
        self.subframes
    }

    pub fn properties(&self) -> TimecodeProperties {
        self.properties
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.properties.frame_rate
    }

    /// Labelled components, applying drop-frame numbering when required.
    pub fn components(&self) -> Components {
        let rate = self.properties.frame_rate;
        let per_day = rate.frames_per_day();
        let days = self.frames / per_day;
        let mut label = self.frames % per_day;

        let drop = rate.drop_frames_per_minute();
        if drop > 0 {
            label = drop_frame_label(label, rate.nominal_fps(), drop);
        }

        let nominal = rate.nominal_fps();
        Components {
            days,
            hours: label / (nominal * 3600),
            minutes: (label / (nominal * 60)) % 60,
            seconds: (label / nominal) % 60,
            frames: label % nominal,
            subframes: self.subframes,
        }
    }

    /// Add a signed duration, wrapping around the upper limit.
    pub fn wrapping_add(&self, duration: Fraction) -> TimecodeResult<Self> {
        let sum = self
            .to_rational()
            .checked_add(duration)
            .ok_or(TimecodeError::Overflow)?;
        Self::from_rational_wrapping(sum, self.properties)
    }

    /// Subtract a signed duration, wrapping around the upper limit.
    pub fn wrapping_sub(&self, duration: Fraction) -> TimecodeResult<Self> {
        let difference = self
            .to_rational()
            .checked_sub(duration)
            .ok_or(TimecodeError::Overflow)?;
        Self::from_rational_wrapping(difference, self.properties)
    }

    /// Add a signed duration, failing if the result leaves `0..upper limit`.
    pub fn checked_add(&self, duration: Fraction) -> TimecodeResult<Self> {
        let sum = self
            .to_rational()
            .checked_add(duration)
            .ok_or(TimecodeError::Overflow)?;
        Self::from_rational(sum, self.properties)
    }

    /// Same elapsed time expressed with different properties.
    pub fn converted(&self, properties: TimecodeProperties) -> TimecodeResult<Self> {
        Self::from_rational(self.to_rational(), properties)
    }

    /// Compare elapsed time regardless of properties.
    pub fn cmp_time(&self, other: &Timecode) -> Ordering {
        self.to_rational().cmp(&other.to_rational())
    }

    /// Label including subframes (`01:00:00:00.40`).
    pub fn to_string_with_subframes(&self) -> String {
        let base_width = if self.properties.subframes_base.count() > 99 { 3 } else { 2 };
        format!(
            "{}.{:0width$}",
            self,
            self.subframes,
            width = base_width
        )
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.components();
        let separator = if self.properties.frame_rate.is_drop() { ';' } else { ':' };
        let frame_width = if self.properties.frame_rate.nominal_fps() >= 100 { 3 } else { 2 };
        if c.days > 0 {
            write!(f, "{} ", c.days)?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:0width$}",
            c.hours,
            c.minutes,
            c.seconds,
            separator,
            c.frames,
            width = frame_width
        )
    }
}

/// Split elapsed seconds into whole frames and subframes (both floored).
fn split_frames(seconds: Fraction, properties: &TimecodeProperties) -> TimecodeResult<(u64, u32)> {
    let rate = properties.frame_rate.rate();
    let numerator = seconds.numerator() as i128 * rate.numerator() as i128;
    let denominator = seconds.denominator() as i128 * rate.denominator() as i128;

    let frames = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    let base = properties.subframes_base.count() as i128;
    let subframes = (remainder * base) / denominator;

    let frames = u64::try_from(frames).map_err(|_| TimecodeError::Overflow)?;
    Ok((frames, subframes as u32))
}

/// Map a real frame count within one day to its drop-frame label number.
fn drop_frame_label(frames: u64, nominal: u64, drop: u64) -> u64 {
    let per_ten_minutes = nominal * 600 - drop * 9;
    let per_minute = nominal * 60 - drop;
    let tens = frames / per_ten_minutes;
    let remainder = frames % per_ten_minutes;
    let adjustment = if remainder < drop {
        drop * 9 * tens
    } else {
        drop * 9 * tens + drop * ((remainder - drop) / per_minute)
    };
    frames + adjustment
}

/// Parse `[D ]HH:MM:SS(:|;)FF[.SF]` into components.
fn parse_components(value: &str) -> Option<Components> {
    let value = value.trim();
    let (days, clock) = match value.split_once(' ') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest.trim()),
        None => (0, value),
    };

    let (clock, subframes) = match clock.split_once('.') {
        Some((c, sf)) => (c, sf.parse::<u32>().ok()?),
        None => (clock, 0),
    };

    let parts: Vec<&str> = clock.split([':', ';']).collect();
    if parts.len() != 4 {
        return None;
    }
    let mut numbers = [0u64; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }

    Some(Components {
        days,
        hours: numbers[0],
        minutes: numbers[1],
        seconds: numbers[2],
        frames: numbers[3],
        subframes,
    })
}
