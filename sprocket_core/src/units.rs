//! # Unit Types
//!
//! Length units for user-entered sprocket dimensions. Every measurement field
//! carries its own unit selector; millimeters are the canonical unit that all
//! values are normalized to before they reach a calculation.
//!
//! ## Rounding
//!
//! Nothing in this module rounds. Values are only rounded to 2 decimals when
//! they are displayed (see [`crate::presenter`]), so repeated conversions do
//! not accumulate rounding error.
//!
//! ## Example
//!
//! ```rust
//! use sprocket_core::units::{convert, from_canonical, to_canonical, LengthUnit};
//!
//! let pitch_mm = to_canonical(0.5, LengthUnit::Inches);
//! assert!((pitch_mm - 12.7).abs() < 1e-9);
//!
//! let back = from_canonical(pitch_mm, LengthUnit::Inches);
//! assert!((back - 0.5).abs() < 1e-12);
//!
//! assert_eq!(convert(1.0, LengthUnit::Inches, LengthUnit::Millimeters), 25.4);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Exact inch definition
pub const MM_PER_INCH: f64 = 25.4;

// ============================================================================
// Unit Selector
// ============================================================================

/// Unit chosen by the user for a single measurement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "inches")]
    Inches,
}

impl LengthUnit {
    /// All selectable units, in display order
    pub const ALL: [LengthUnit; 2] = [LengthUnit::Millimeters, LengthUnit::Inches];

    /// Short label used next to formatted values ("mm", "inches")
    pub fn label(self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Inches => "inches",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LengthUnit {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Ok(LengthUnit::Millimeters),
            "in" | "inch" | "inches" | "\"" => Ok(LengthUnit::Inches),
            _ => Err(CalcError::UnknownUnit { unit: s.to_string() }),
        }
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a value expressed in `unit` to millimeters.
pub fn to_canonical(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Millimeters => value,
        LengthUnit::Inches => value * MM_PER_INCH,
    }
}

/// Convert a millimeter value to `unit`.
pub fn from_canonical(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Millimeters => value,
        LengthUnit::Inches => value / MM_PER_INCH,
    }
}

/// Re-express a value in another unit, keeping the physical length.
pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to {
        return value;
    }
    from_canonical(to_canonical(value, from), to)
}

/// Default absent or unusable input to `0.0`.
///
/// NaN, infinities and negative values are all treated as unusable; the
/// result is always finite and non-negative.
pub fn sanitize(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Parse user-entered text, defaulting anything unparseable to `0.0`.
pub fn parse_lenient(raw: &str) -> f64 {
    sanitize(parse_optional(raw))
}

/// Parse user-entered text, keeping "absent" distinct from a number.
///
/// Empty text is `None`. Unparseable text is also `None`; it gets defaulted later.
pub fn parse_optional(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

// ============================================================================
// Length Newtypes
// ============================================================================

/// Length in millimeters (canonical)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Inches> for Millimeters {
    fn from(inches: Inches) -> Self {
        Millimeters(inches.0 * MM_PER_INCH)
    }
}

impl From<Millimeters> for Inches {
    fn from(mm: Millimeters) -> Self {
        Inches(mm.0 / MM_PER_INCH)
    }
}

impl Millimeters {
    /// Canonical length of a user-entered value.
    ///
    /// The value is sanitized before conversion and the converted length is
    /// sanitized again, so an input that overflows while converting (e.g.
    /// `1e307` inches) also becomes `0.0`.
    pub fn from_unit(value: f64, unit: LengthUnit) -> Self {
        let value = sanitize(Some(value));
        let mm = match unit {
            LengthUnit::Millimeters => Millimeters(value),
            LengthUnit::Inches => Inches(value).into(),
        };
        mm.finite_or_zero()
    }

    /// `0.0` unless finite and non-negative
    pub fn finite_or_zero(self) -> Self {
        Millimeters(sanitize(Some(self.0)))
    }

    /// This length expressed in `unit`
    pub fn in_unit(self, unit: LengthUnit) -> f64 {
        match unit {
            LengthUnit::Millimeters => self.0,
            LengthUnit::Inches => Inches::from(self).0,
        }
    }
}

macro_rules! impl_length_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_length_arithmetic!(Millimeters);
impl_length_arithmetic!(Inches);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millimeters_identity() {
        for v in [0.0, 1.0, 12.7, 161.7, 1e6] {
            assert_eq!(to_canonical(v, LengthUnit::Millimeters), v);
            assert_eq!(from_canonical(v, LengthUnit::Millimeters), v);
        }
    }

    #[test]
    fn test_inches_to_mm() {
        assert_eq!(to_canonical(1.0, LengthUnit::Inches), 25.4);
        assert!((to_canonical(0.5, LengthUnit::Inches) - 12.7).abs() < 1e-12);
        assert_eq!(to_canonical(100.0, LengthUnit::Inches), 2540.0);
    }

    #[test]
    fn test_inches_roundtrip() {
        for v in [0.0, 0.001, 1.0, 12.7, 161.70, 2540.0, 98765.4321] {
            let back = to_canonical(from_canonical(v, LengthUnit::Inches), LengthUnit::Inches);
            assert!((back - v).abs() <= 1e-9 * v.max(1.0), "{} -> {}", v, back);
        }
    }

    #[test]
    fn test_convert_keeps_length() {
        let inches = convert(50.8, LengthUnit::Millimeters, LengthUnit::Inches);
        assert!((inches - 2.0).abs() < 1e-12);
        assert_eq!(convert(3.0, LengthUnit::Inches, LengthUnit::Inches), 3.0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(None), 0.0);
        assert_eq!(sanitize(Some(f64::NAN)), 0.0);
        assert_eq!(sanitize(Some(f64::INFINITY)), 0.0);
        assert_eq!(sanitize(Some(f64::NEG_INFINITY)), 0.0);
        assert_eq!(sanitize(Some(-4.0)), 0.0);
        assert_eq!(sanitize(Some(4.5)), 4.5);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_lenient("12.7"), 12.7);
        assert_eq!(parse_lenient("  40 "), 40.0);
        assert_eq!(parse_lenient(""), 0.0);
        assert_eq!(parse_lenient("abc"), 0.0);
        assert_eq!(parse_lenient("NaN"), 0.0);
        assert_eq!(parse_lenient("inf"), 0.0);
        assert_eq!(parse_lenient("-3"), 0.0);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("mm".parse::<LengthUnit>().unwrap(), LengthUnit::Millimeters);
        assert_eq!("Inches".parse::<LengthUnit>().unwrap(), LengthUnit::Inches);
        assert_eq!("in".parse::<LengthUnit>().unwrap(), LengthUnit::Inches);
        assert!("furlong".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_newtype_conversion() {
        let mm: Millimeters = Inches(2.0).into();
        assert!((mm.value() - 50.8).abs() < 1e-12);
        let inches: Inches = Millimeters(25.4).into();
        assert!((inches.value() - 1.0).abs() < 1e-12);
        assert_eq!((Millimeters(10.0) + Millimeters(5.0) * 2.0).value(), 20.0);
        assert!((Millimeters(12.7).in_unit(LengthUnit::Inches) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_unit_overflow_is_zero() {
        assert_eq!(Millimeters::from_unit(1e307, LengthUnit::Inches).value(), 0.0);
        assert_eq!(Millimeters::from_unit(f64::MAX, LengthUnit::Millimeters).value(), f64::MAX);
        assert_eq!(Millimeters::from_unit(-2.0, LengthUnit::Inches).value(), 0.0);
        assert_eq!(Millimeters::from_unit(0.5, LengthUnit::Inches).value(), 12.7);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&LengthUnit::Inches).unwrap(), "\"inches\"");
        assert_eq!(serde_json::to_string(&LengthUnit::Millimeters).unwrap(), "\"mm\"");
        assert_eq!(serde_json::to_string(&Millimeters(12.5)).unwrap(), "12.5");
    }
}
