//! # Pitch Circle Diameter
//!
//! PCD is either derived from chain geometry (automatic) or typed in by the
//! user (manual). The automatic value is always computed, whichever mode is
//! selected; only the selected mode's value flows into a request.
//!
//! ## Formula
//!
//! ```text
//! PCD = (chain pitch × number of teeth) / π
//! ```
//!
//! This treats the pitch circle circumference as `N × p`. The geometrically
//! exact chordal form is `p / sin(π / N)`; it is larger by about 0.1% for 40
//! teeth and about 2% for 9 teeth. Requests always carry the simple form;
//! [`compute_chordal_pcd`] is only shown next to the suggestion.
//!
//! ## Example
//!
//! ```rust
//! use sprocket_core::pcd::compute_automatic_pcd;
//!
//! let pcd = compute_automatic_pcd(12.7, 40.0);
//! assert!((pcd - 161.70).abs() < 0.01);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::units::{sanitize, LengthUnit, Millimeters};

/// PCD from chain pitch (mm) and tooth count. Unusable inputs, and a
/// product that overflows, count as `0.0`.
pub fn compute_automatic_pcd(chain_pitch_mm: f64, number_of_teeth: f64) -> f64 {
    let pitch = sanitize(Some(chain_pitch_mm));
    let teeth = sanitize(Some(number_of_teeth));
    sanitize(Some((pitch * teeth) / PI))
}

/// Chordal PCD `p / sin(π / N)`, for comparison only. Zero below one tooth.
pub fn compute_chordal_pcd(chain_pitch_mm: f64, number_of_teeth: f64) -> f64 {
    let pitch = sanitize(Some(chain_pitch_mm));
    let teeth = sanitize(Some(number_of_teeth));
    if teeth < 1.0 {
        return 0.0;
    }
    // sin(π) is ~1.2e-16 for a single tooth; the result is meaningless but finite
    let value = pitch / (PI / teeth).sin();
    sanitize(Some(value))
}

/// Which PCD the request should carry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PcdSelection {
    /// Derived from chain pitch and tooth count
    #[default]
    Automatic,
    /// Typed by the user, in its own unit
    Manual {
        value: Option<f64>,
        unit: LengthUnit,
    },
}

impl PcdSelection {
    pub fn manual(value: f64, unit: LengthUnit) -> Self {
        PcdSelection::Manual { value: Some(value), unit }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, PcdSelection::Manual { .. })
    }

    /// Resolve to millimeters.
    ///
    /// A manual selection without a usable value resolves to `0.0`, not to the
    /// automatic value.
    pub fn resolve(&self, chain_pitch_mm: f64, number_of_teeth: f64) -> f64 {
        match *self {
            PcdSelection::Automatic => compute_automatic_pcd(chain_pitch_mm, number_of_teeth),
            PcdSelection::Manual { value, unit } => Millimeters::from_unit(sanitize(value), unit).value(),
        }
    }
}
