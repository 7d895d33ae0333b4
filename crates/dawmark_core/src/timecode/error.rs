//! Timecode error types.

/// Errors that can occur while building or converting timecode values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimecodeError {
    /// A rational time string did not match `-?digits(/digits)?s`.
    #[error("Malformed rational time string: '{0}'")]
    MalformedRational(String),

    /// A rational time string had a zero denominator.
    #[error("Rational time string has a zero denominator: '{0}'")]
    ZeroDenominator(String),

    /// A timecode string could not be parsed.
    #[error("Malformed timecode string: '{0}'")]
    MalformedTimecode(String),

    /// A timecode component is outside its valid range.
    #[error("Invalid timecode component {component} = {value}")]
    InvalidComponent { component: &'static str, value: u64 },

    /// A value falls outside the timecode's upper limit.
    #[error("Value {value} is outside the timecode range 0..{limit}")]
    OutOfRange { value: String, limit: String },

    /// Real-time value was not a finite number.
    #[error("Real-time value is not finite")]
    NonFinite,

    /// Intermediate arithmetic overflowed.
    #[error("Timecode arithmetic overflowed")]
    Overflow,
}

impl TimecodeError {
    /// Create an invalid component error.
    pub fn invalid_component(component: &'static str, value: u64) -> Self {
        Self::InvalidComponent { component, value }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(value: impl ToString, limit: impl ToString) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            limit: limit.to_string(),
        }
    }
}

/// Type alias for timecode operation results.
pub type TimecodeResult<T> = Result<T, TimecodeError>;
