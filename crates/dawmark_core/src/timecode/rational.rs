//! Exact rational time values.
//!
//! Time attributes in the nonlinear-editing XML format are written as a
//! fraction of seconds (`"3600/25s"`, `"-100s"`). `Fraction` keeps them
//! exact so that nested offsets can be accumulated without drift.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TimecodeError;

/// A reduced rational number of seconds.
///
/// The denominator is always positive and the fraction is always stored in
/// lowest terms, so structural equality is numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Zero seconds.
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    /// Create a fraction, reducing it to lowest terms.
    ///
    /// Returns `None` when the denominator is zero or the reduced value does
    /// not fit into 64-bit terms.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        Self::from_wide(numerator as i128, denominator as i128)
    }

    /// Whole seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            numerator: seconds,
            denominator: 1,
        }
    }

    /// Approximate a floating-point number of seconds to the nearest nanosecond.
    pub fn from_seconds_f64(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() {
            return None;
        }
        let nanos = (seconds * 1_000_000_000.0).round();
        if nanos.abs() > i64::MAX as f64 {
            return None;
        }
        Self::new(nanos as i64, 1_000_000_000)
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Value in seconds as a float (lossy).
    pub fn as_seconds_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn checked_add(&self, other: Fraction) -> Option<Fraction> {
        let n = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::from_wide(n, d)
    }

    pub fn checked_sub(&self, other: Fraction) -> Option<Fraction> {
        let n = self.numerator as i128 * other.denominator as i128
            - other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::from_wide(n, d)
    }

    pub fn checked_mul(&self, other: Fraction) -> Option<Fraction> {
        let n = self.numerator as i128 * other.numerator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::from_wide(n, d)
    }

    pub fn checked_div(&self, other: Fraction) -> Option<Fraction> {
        let n = self.numerator as i128 * other.denominator as i128;
        let d = self.denominator as i128 * other.numerator as i128;
        Self::from_wide(n, d)
    }

    pub fn checked_neg(&self) -> Option<Fraction> {
        Some(Fraction {
            numerator: self.numerator.checked_neg()?,
            denominator: self.denominator,
        })
    }

    /// Largest integer less than or equal to the value.
    pub fn floor(&self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// Euclidean remainder: the result is always in `[0, modulus)`.
    ///
    /// Returns `None` for a non-positive modulus.
    pub fn rem_euclid(&self, modulus: Fraction) -> Option<Fraction> {
        if modulus.numerator <= 0 {
            return None;
        }
        // a mod m over a common denominator
        let d = self.denominator as i128 * modulus.denominator as i128;
        let a = self.numerator as i128 * modulus.denominator as i128;
        let m = modulus.numerator as i128 * self.denominator as i128;
        Self::from_wide(a.rem_euclid(m), d)
    }

    /// Format as an XML rational time string (`"1001/30000s"`, `"5s"`).
    pub fn to_time_string(&self) -> String {
        self.to_string()
    }

    pub(crate) fn from_wide(numerator: i128, denominator: i128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()).max(1) as i128;
        let sign = if denominator < 0 { -1 } else { 1 };
        let n = sign * numerator / divisor;
        let d = sign * denominator / divisor;
        Some(Self {
            numerator: i64::try_from(n).ok()?,
            denominator: i64::try_from(d).ok()?,
        })
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}s", self.numerator)
        } else {
            write!(f, "{}/{}s", self.numerator, self.denominator)
        }
    }
}

impl FromStr for Fraction {
    type Err = TimecodeError;

    /// Parse `("-")? digits "/" digits "s"` or `("-")? digits "s"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TimecodeError::MalformedRational(s.to_string());

        let body = s.strip_suffix('s').ok_or_else(malformed)?;
        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let (num_str, den_str) = match body.split_once('/') {
            Some((n, d)) => (n, Some(d)),
            None => (body, None),
        };

        let numerator = parse_digits(num_str).ok_or_else(malformed)?;
        let denominator = match den_str {
            Some(d) => parse_digits(d).ok_or_else(malformed)?,
            None => 1,
        };
        if denominator == 0 {
            return Err(TimecodeError::ZeroDenominator(s.to_string()));
        }

        let numerator = if negative { -numerator } else { numerator };
        Fraction::new(numerator, denominator).ok_or_else(malformed)
    }
}

impl From<Fraction> for String {
    fn from(value: Fraction) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Fraction {
    type Error = TimecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse a non-empty run of ASCII digits.
fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
