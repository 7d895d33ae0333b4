//! Timecode arithmetic and the rational-time codec.
//!
//! This module provides:
//! - `Fraction`: exact rational seconds, parsed from `"N/Ds"` strings
//! - `FrameRate` and `TimecodeProperties`: rate, subframe base, and range
//! - `Timecode`: a wrapping frame position with drop-frame labels
//!
//! # Example
//!
//! ```
//! use dawmark_core::timecode::{FrameRate, Timecode, TimecodeProperties};
//!
//! let props = TimecodeProperties::new(FrameRate::Fps25);
//! let tc = Timecode::from_time_string("3600/25s", props).unwrap();
//! assert_eq!(tc.to_string(), "00:02:24:00");
//! assert_eq!(tc.to_time_string(), "144s");
//! ```

mod error;
mod frame_rate;
mod rational;
mod timecode;

pub use error::{TimecodeError, TimecodeResult};
pub use frame_rate::{FrameRate, SubframesBase, TimecodeProperties, UpperLimit};
pub use rational::Fraction;
pub use timecode::{Components, Timecode};
