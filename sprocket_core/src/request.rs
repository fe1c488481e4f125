//! # Request Normalizer
//!
//! Turns raw measurement inputs (each in its own unit) into the
//! [`NormalizedRequest`] sent to the calculation service: every length in
//! millimeters, PCD resolved, tooth count as an integer.
//!
//! Normalization is total. Missing or garbage values become `0.0`; the
//! service never receives a partial request.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "chainPitch": 12.7,
//!   "chainRollerDiameter": 8.51,
//!   "od": 170.0,
//!   "hubDia": 60.0,
//!   "hubLength": 40.0,
//!   "zz": 7.2,
//!   "numberOfTeeth": 40,
//!   "pcd": 161.7014222,
//!   "chainType": "Simplex",
//!   "sprocketRmcPerKg": 95.0,
//!   "sprocketPc": 120.0,
//!   "sprocketHt": 35.0,
//!   "hubRmcPerKg": 90.0,
//!   "hubPc": 80.0,
//!   "hubHt": 20.0
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::fields::{MeasurementField, MeasurementInput};
use crate::pcd::PcdSelection;
use crate::units::sanitize;

// ============================================================================
// Cost Rates
// ============================================================================

/// Per-component cost inputs typed by the user (currency, unitless).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateField {
    SprocketRmcPerKg,
    SprocketPc,
    SprocketHt,
    HubRmcPerKg,
    HubPc,
    HubHt,
}

impl RateField {
    pub const ALL: [RateField; 6] = [
        RateField::SprocketRmcPerKg,
        RateField::SprocketPc,
        RateField::SprocketHt,
        RateField::HubRmcPerKg,
        RateField::HubPc,
        RateField::HubHt,
    ];

    /// Wire/form key
    pub fn key(self) -> &'static str {
        match self {
            RateField::SprocketRmcPerKg => "sprocketRmcPerKg",
            RateField::SprocketPc => "sprocketPc",
            RateField::SprocketHt => "sprocketHt",
            RateField::HubRmcPerKg => "hubRmcPerKg",
            RateField::HubPc => "hubPc",
            RateField::HubHt => "hubHt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateField::SprocketRmcPerKg => "Sprocket RMC/KG",
            RateField::SprocketPc => "Sprocket PC",
            RateField::SprocketHt => "Sprocket HT",
            RateField::HubRmcPerKg => "Hub RMC/KG",
            RateField::HubPc => "Hub PC",
            RateField::HubHt => "Hub HT",
        }
    }
}

impl fmt::Display for RateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RateField {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateField::ALL
            .into_iter()
            .find(|rate| rate.key() == s)
            .ok_or_else(|| CalcError::unknown_field(s))
    }
}

/// Raw material rate, processing cost and heat treatment cost per component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRates {
    pub sprocket_rmc_per_kg: f64,
    pub sprocket_pc: f64,
    pub sprocket_ht: f64,
    pub hub_rmc_per_kg: f64,
    pub hub_pc: f64,
    pub hub_ht: f64,
}

impl CostRates {
    pub fn get(&self, rate: RateField) -> f64 {
        match rate {
            RateField::SprocketRmcPerKg => self.sprocket_rmc_per_kg,
            RateField::SprocketPc => self.sprocket_pc,
            RateField::SprocketHt => self.sprocket_ht,
            RateField::HubRmcPerKg => self.hub_rmc_per_kg,
            RateField::HubPc => self.hub_pc,
            RateField::HubHt => self.hub_ht,
        }
    }

    /// Set a rate; unusable values are stored as `0.0`
    pub fn set(&mut self, rate: RateField, value: Option<f64>) {
        let value = sanitize(value);
        match rate {
            RateField::SprocketRmcPerKg => self.sprocket_rmc_per_kg = value,
            RateField::SprocketPc => self.sprocket_pc = value,
            RateField::SprocketHt => self.sprocket_ht = value,
            RateField::HubRmcPerKg => self.hub_rmc_per_kg = value,
            RateField::HubPc => self.hub_pc = value,
            RateField::HubHt => self.hub_ht = value,
        }
    }

    fn sanitized(self) -> Self {
        let mut clean = CostRates::default();
        for rate in RateField::ALL {
            clean.set(rate, Some(self.get(rate)));
        }
        clean
    }
}

// ============================================================================
// Normalized Request
// ============================================================================

/// The request handed to the calculation service. All lengths in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRequest {
    pub chain_pitch: f64,
    pub chain_roller_diameter: f64,
    #[serde(rename = "od")]
    pub outer_diameter: f64,
    #[serde(rename = "hubDia")]
    pub hub_diameter: f64,
    pub hub_length: f64,
    pub zz: f64,
    pub number_of_teeth: u32,
    /// Resolved PCD (automatic or manual), millimeters
    pub pcd: f64,
    pub chain_type: String,
    #[serde(flatten)]
    pub rates: CostRates,
}

impl NormalizedRequest {
    /// Attach the pass-through fields that need no unit handling.
    pub fn with_context(mut self, chain_type: impl Into<String>, rates: CostRates) -> Self {
        self.chain_type = chain_type.into().trim().to_string();
        self.rates = rates.sanitized();
        self
    }

    /// Canonical value of a measurement field (`pcd` for the manual PCD field)
    pub fn measurement(&self, field: MeasurementField) -> f64 {
        match field {
            MeasurementField::ChainPitch => self.chain_pitch,
            MeasurementField::ChainRollerDiameter => self.chain_roller_diameter,
            MeasurementField::OuterDiameter => self.outer_diameter,
            MeasurementField::HubDiameter => self.hub_diameter,
            MeasurementField::HubLength => self.hub_length,
            MeasurementField::Zz => self.zz,
            MeasurementField::ManualPcd => self.pcd,
        }
    }

    fn set_measurement(&mut self, field: MeasurementField, value: f64) {
        match field {
            MeasurementField::ChainPitch => self.chain_pitch = value,
            MeasurementField::ChainRollerDiameter => self.chain_roller_diameter = value,
            MeasurementField::OuterDiameter => self.outer_diameter = value,
            MeasurementField::HubDiameter => self.hub_diameter = value,
            MeasurementField::HubLength => self.hub_length = value,
            MeasurementField::Zz => self.zz = value,
            MeasurementField::ManualPcd => {}
        }
    }

    /// Check every numeric field is finite and non-negative.
    ///
    /// Requests built by [`normalize`] always pass; this guards requests that
    /// arrive over the wire.
    pub fn validate(&self) -> CalcResult<()> {
        let lengths = MeasurementField::MEASUREMENTS
            .into_iter()
            .map(|field| (field.key(), self.measurement(field)))
            .chain(std::iter::once(("pcd", self.pcd)));
        let rates = RateField::ALL.into_iter().map(|rate| (rate.key(), self.rates.get(rate)));

        for (key, value) in lengths.chain(rates) {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(key, value.to_string(), "Value must be finite"));
            }
            if value < 0.0 {
                return Err(CalcError::invalid_input(key, value.to_string(), "Value must be non-negative"));
            }
        }
        Ok(())
    }
}

/// Largest tooth count carried on the wire. Larger counts are capped here
/// before both the integer count and the automatic PCD are derived.
pub const MAX_TEETH: u32 = u32::MAX;

/// Normalize raw measurement inputs into a request.
///
/// Each measurement is converted with its own unit. `ManualPcd` inputs are
/// skipped here; PCD comes from `pcd_selection`, using the canonical chain
/// pitch and the raw (defaulted) tooth count for the automatic case. When a
/// field appears more than once, the last entry wins; a missing field is `0.0`.
///
/// The result carries an empty chain type and zero rates; see
/// [`NormalizedRequest::with_context`].
pub fn normalize(
    fields: &[MeasurementInput],
    pcd_selection: &PcdSelection,
    number_of_teeth: f64,
) -> NormalizedRequest {
    let mut request = NormalizedRequest {
        chain_pitch: 0.0,
        chain_roller_diameter: 0.0,
        outer_diameter: 0.0,
        hub_diameter: 0.0,
        hub_length: 0.0,
        zz: 0.0,
        number_of_teeth: 0,
        pcd: 0.0,
        chain_type: String::new(),
        rates: CostRates::default(),
    };

    for input in fields.iter().filter(|input| !input.field.is_pcd_related()) {
        let canonical = input.canonical();
        debug!(
            field = input.field.key(),
            raw = ?input.raw_value,
            unit = input.unit.label(),
            canonical,
            "normalized measurement"
        );
        request.set_measurement(input.field, canonical);
    }

    let teeth = sanitize(Some(number_of_teeth)).min(f64::from(MAX_TEETH));
    request.number_of_teeth = teeth.trunc() as u32;
    request.pcd = pcd_selection.resolve(request.chain_pitch, teeth);
    debug!(manual = pcd_selection.is_manual(), pcd = request.pcd, "resolved PCD");

    request
}

// ============================================================================
// Submission
// ============================================================================

/// A normalized request together with the raw inputs it was built from.
///
/// Exports label values the way the user typed them ("0.50 inches"), so the
/// raw value and unit of every field are retained here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub request: NormalizedRequest,
    /// One entry per [`MeasurementField`], including the manual PCD input
    pub inputs: Vec<MeasurementInput>,
    pub raw_teeth: Option<f64>,
    pub pcd_selection: PcdSelection,
}

impl Submission {
    pub fn new(
        request: NormalizedRequest,
        inputs: Vec<MeasurementInput>,
        raw_teeth: Option<f64>,
        pcd_selection: PcdSelection,
    ) -> Self {
        Submission {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            request,
            inputs,
            raw_teeth,
            pcd_selection,
        }
    }

    /// Raw input for a field (empty millimeter input if it was never entered)
    pub fn input(&self, field: MeasurementField) -> MeasurementInput {
        self.inputs
            .iter()
            .rev()
            .find(|input| input.field == field)
            .copied()
            .unwrap_or_else(|| MeasurementInput::empty(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::LengthUnit;

    fn mm(field: MeasurementField, value: f64) -> MeasurementInput {
        MeasurementInput::new(field, Some(value), LengthUnit::Millimeters)
    }

    #[test]
    fn test_normalize_millimeters() {
        let fields = vec![
            mm(MeasurementField::ChainPitch, 12.7),
            mm(MeasurementField::ChainRollerDiameter, 8.51),
            mm(MeasurementField::OuterDiameter, 170.0),
            mm(MeasurementField::HubDiameter, 60.0),
            mm(MeasurementField::HubLength, 40.0),
            mm(MeasurementField::Zz, 7.2),
        ];
        let request = normalize(&fields, &PcdSelection::Automatic, 40.0);

        assert_eq!(request.chain_pitch, 12.7);
        assert_eq!(request.outer_diameter, 170.0);
        assert_eq!(request.zz, 7.2);
        assert_eq!(request.number_of_teeth, 40);
        assert!((request.pcd - 161.70).abs() < 0.005);
    }

    #[test]
    fn test_inch_pitch_composes_with_pcd() {
        let fields = vec![MeasurementInput::new(
            MeasurementField::ChainPitch,
            Some(0.5),
            LengthUnit::Inches,
        )];
        let request = normalize(&fields, &PcdSelection::Automatic, 40.0);
        assert!((request.chain_pitch - 12.7).abs() < 1e-9);
        assert!((request.pcd - 161.70).abs() < 0.005);
    }

    #[test]
    fn test_overflowing_lengths_stay_finite() {
        let fields = vec![MeasurementInput::new(
            MeasurementField::ChainPitch,
            Some(1e307),
            LengthUnit::Inches,
        )];
        let request = normalize(&fields, &PcdSelection::Automatic, 40.0);
        assert_eq!(request.chain_pitch, 0.0);
        assert_eq!(request.pcd, 0.0);

        let request = normalize(&[mm(MeasurementField::ChainPitch, 1e308)], &PcdSelection::Automatic, 40.0);
        assert_eq!(request.chain_pitch, 1e308);
        assert_eq!(request.pcd, 0.0);
        assert!(request.validate().is_ok());

        let json = serde_json::to_value(&request).unwrap();
        assert!(!json["pcd"].is_null());
        assert!(!json["chainPitch"].is_null());
    }

    #[test]
    fn test_tooth_count_is_capped() {
        let request = normalize(&[mm(MeasurementField::ChainPitch, 1.0)], &PcdSelection::Automatic, 1e12);
        assert_eq!(request.number_of_teeth, MAX_TEETH);
        let expected = f64::from(MAX_TEETH) / std::f64::consts::PI;
        assert!((request.pcd - expected).abs() < 1e-3);
    }

    #[test]
    fn test_manual_pcd_overrides() {
        let fields = vec![
            mm(MeasurementField::ChainPitch, 12.7),
            // ignored: PCD comes from the selection
            mm(MeasurementField::ManualPcd, 55.0),
        ];
        let selection = PcdSelection::manual(100.0, LengthUnit::Inches);
        let request = normalize(&fields, &selection, 40.0);
        assert_eq!(request.pcd, 2540.0);
    }

    #[test]
    fn test_each_field_uses_its_own_unit() {
        let fields = vec![
            MeasurementInput::new(MeasurementField::OuterDiameter, Some(2.0), LengthUnit::Inches),
            mm(MeasurementField::HubDiameter, 2.0),
        ];
        let request = normalize(&fields, &PcdSelection::Automatic, 0.0);
        assert!((request.outer_diameter - 50.8).abs() < 1e-12);
        assert_eq!(request.hub_diameter, 2.0);
    }

    #[test]
    fn test_garbage_never_reaches_request() {
        let garbage = [None, Some(f64::NAN), Some(f64::INFINITY), Some(f64::NEG_INFINITY), Some(-1.0)];
        for raw in garbage {
            let fields: Vec<_> = MeasurementField::ALL
                .into_iter()
                .map(|field| MeasurementInput::new(field, raw, LengthUnit::Inches))
                .collect();
            let selections = [
                PcdSelection::Automatic,
                PcdSelection::Manual { value: raw, unit: LengthUnit::Inches },
            ];
            for selection in selections {
                let teeth = raw.unwrap_or(f64::NAN);
                let request = normalize(&fields, &selection, teeth);
                for field in MeasurementField::ALL {
                    let value = request.measurement(field);
                    assert!(value.is_finite() && value == 0.0, "{:?} -> {}", field, value);
                }
                assert_eq!(request.number_of_teeth, 0);
                assert!(request.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let request = normalize(&[], &PcdSelection::Automatic, 40.0);
        assert_eq!(request.chain_pitch, 0.0);
        assert_eq!(request.pcd, 0.0);
        assert_eq!(request.number_of_teeth, 40);
    }

    #[test]
    fn test_fractional_teeth() {
        let fields = vec![mm(MeasurementField::ChainPitch, 10.0)];
        let request = normalize(&fields, &PcdSelection::Automatic, 40.5);
        assert_eq!(request.number_of_teeth, 40);
        assert!((request.pcd - 10.0 * 40.5 / std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_wire_keys() {
        let mut rates = CostRates::default();
        rates.set(RateField::HubPc, Some(80.0));
        let request = normalize(&[mm(MeasurementField::OuterDiameter, 170.0)], &PcdSelection::Automatic, 17.0)
            .with_context("  Simplex ", rates);
        let json = serde_json::to_value(&request).unwrap();

        for key in ["chainPitch", "chainRollerDiameter", "od", "hubDia", "hubLength", "zz", "numberOfTeeth", "pcd"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["chainType"], "Simplex");
        assert_eq!(json["hubPc"], 80.0);
        assert_eq!(json["od"], 170.0);

        let roundtrip: NormalizedRequest = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, request);
    }

    #[test]
    fn test_validate_rejects_wire_garbage() {
        let mut request = normalize(&[], &PcdSelection::Automatic, 0.0);
        request.hub_length = -3.0;
        let err = request.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_rate_keys() {
        for rate in RateField::ALL {
            assert_eq!(rate.key().parse::<RateField>().unwrap(), rate);
            assert_eq!(serde_json::to_string(&rate).unwrap(), format!("\"{}\"", rate.key()));
        }
    }

    #[test]
    fn test_submission_keeps_raw_units() {
        let inputs = vec![MeasurementInput::new(MeasurementField::Zz, Some(0.25), LengthUnit::Inches)];
        let request = normalize(&inputs, &PcdSelection::Automatic, 12.0);
        let submission = Submission::new(request, inputs, Some(12.0), PcdSelection::Automatic);

        let zz = submission.input(MeasurementField::Zz);
        assert_eq!(zz.unit, LengthUnit::Inches);
        assert_eq!(zz.raw_value, Some(0.25));
        assert_eq!(submission.input(MeasurementField::HubLength).raw_value, None);
    }
}
