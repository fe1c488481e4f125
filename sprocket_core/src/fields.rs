//! # Measurement Field Schema
//!
//! The fixed list of unit-capable fields on the sprocket form. Form keys are
//! resolved against this schema, so a misspelled key is rejected instead of
//! silently becoming a zero-valued field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;
use crate::units::{parse_optional, sanitize, LengthUnit, Millimeters};

/// A named physical quantity entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementField {
    ChainPitch,
    ChainRollerDiameter,
    #[serde(rename = "od")]
    OuterDiameter,
    #[serde(rename = "hubDia")]
    HubDiameter,
    HubLength,
    Zz,
    #[serde(rename = "pcdManual")]
    ManualPcd,
}

impl MeasurementField {
    /// Every field, in form order
    pub const ALL: [MeasurementField; 7] = [
        MeasurementField::ChainPitch,
        MeasurementField::ChainRollerDiameter,
        MeasurementField::OuterDiameter,
        MeasurementField::HubDiameter,
        MeasurementField::HubLength,
        MeasurementField::Zz,
        MeasurementField::ManualPcd,
    ];

    /// Fields normalized directly into the request (PCD is resolved separately)
    pub const MEASUREMENTS: [MeasurementField; 6] = [
        MeasurementField::ChainPitch,
        MeasurementField::ChainRollerDiameter,
        MeasurementField::OuterDiameter,
        MeasurementField::HubDiameter,
        MeasurementField::HubLength,
        MeasurementField::Zz,
    ];

    /// Wire/form key
    pub fn key(self) -> &'static str {
        match self {
            MeasurementField::ChainPitch => "chainPitch",
            MeasurementField::ChainRollerDiameter => "chainRollerDiameter",
            MeasurementField::OuterDiameter => "od",
            MeasurementField::HubDiameter => "hubDia",
            MeasurementField::HubLength => "hubLength",
            MeasurementField::Zz => "zz",
            MeasurementField::ManualPcd => "pcdManual",
        }
    }

    /// Human-readable label for reports
    pub fn label(self) -> &'static str {
        match self {
            MeasurementField::ChainPitch => "Chain Pitch",
            MeasurementField::ChainRollerDiameter => "Chain Roller Diameter",
            MeasurementField::OuterDiameter => "OD (Outer Diameter)",
            MeasurementField::HubDiameter => "HUB DIA",
            MeasurementField::HubLength => "HUB LENGTH",
            MeasurementField::Zz => "ZZ",
            MeasurementField::ManualPcd => "Manual PCD",
        }
    }

    /// Whether this field only matters for manual PCD selection
    pub fn is_pcd_related(self) -> bool {
        matches!(self, MeasurementField::ManualPcd)
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MeasurementField {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| CalcError::unknown_field(s))
    }
}

/// One measurement as entered: raw value (possibly absent) plus its own unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    pub field: MeasurementField,
    /// Value as typed; `None` when empty or unparseable
    pub raw_value: Option<f64>,
    pub unit: LengthUnit,
}

impl MeasurementInput {
    pub fn new(field: MeasurementField, raw_value: Option<f64>, unit: LengthUnit) -> Self {
        MeasurementInput { field, raw_value, unit }
    }

    /// Empty input for a field, in millimeters
    pub fn empty(field: MeasurementField) -> Self {
        MeasurementInput::new(field, None, LengthUnit::Millimeters)
    }

    /// Build from text as typed into a form
    pub fn from_text(field: MeasurementField, text: &str, unit: LengthUnit) -> Self {
        MeasurementInput::new(field, parse_optional(text), unit)
    }

    /// The raw value after defaulting, still in the user's unit
    pub fn value(&self) -> f64 {
        sanitize(self.raw_value)
    }

    /// Finite, non-negative value in millimeters
    pub fn canonical(&self) -> f64 {
        Millimeters::from_unit(self.value(), self.unit).value()
    }
}
