//! # Sprocket Form State
//!
//! Holds what the user has typed so far and reacts to edits. Front ends send
//! [`FormEdit`] messages and get back a [`FormUpdate`]; whenever chain pitch,
//! its unit, or the tooth count changes, the update carries a fresh automatic
//! PCD suggestion. The suggestion is recomputed regardless of the selected
//! PCD mode.
//!
//! ## Example
//!
//! ```rust
//! use sprocket_core::fields::MeasurementField;
//! use sprocket_core::form::{FormEdit, SprocketForm};
//! use sprocket_core::units::LengthUnit;
//!
//! let mut form = SprocketForm::new();
//! form.apply(FormEdit::unit(MeasurementField::ChainPitch, LengthUnit::Inches));
//! form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "0.5"));
//! let update = form.apply(FormEdit::Teeth("40".to_string()));
//!
//! let pcd = update.pcd_suggestion.unwrap();
//! assert!((pcd - 161.70).abs() < 0.01);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::fields::{MeasurementField, MeasurementInput};
use crate::pcd::{compute_automatic_pcd, PcdSelection};
use crate::request::{normalize, CostRates, RateField, Submission};
use crate::units::{convert, parse_optional, sanitize, LengthUnit};

/// Which PCD source is selected on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcdMode {
    #[default]
    #[serde(alias = "auto")]
    Automatic,
    Manual,
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEdit {
    /// Value typed into a measurement field
    Measurement { field: MeasurementField, text: String },
    /// Unit selector changed for a measurement field
    Unit { field: MeasurementField, unit: LengthUnit },
    Teeth(String),
    ChainType(String),
    SelectPcd(PcdMode),
    Rate { rate: RateField, text: String },
}

impl FormEdit {
    pub fn measurement(field: MeasurementField, text: impl Into<String>) -> Self {
        FormEdit::Measurement { field, text: text.into() }
    }

    pub fn unit(field: MeasurementField, unit: LengthUnit) -> Self {
        FormEdit::Unit { field, unit }
    }

    pub fn rate(rate: RateField, text: impl Into<String>) -> Self {
        FormEdit::Rate { rate, text: text.into() }
    }
}

/// What changed as a result of an edit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormUpdate {
    /// New automatic PCD (mm), present when its inputs changed
    pub pcd_suggestion: Option<f64>,
}

/// Raw form contents, one entry per measurement field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprocketForm {
    pub chain_type: String,
    pub number_of_teeth: Option<f64>,
    measurements: BTreeMap<MeasurementField, MeasurementInput>,
    pub pcd_mode: PcdMode,
    pub rates: CostRates,
}

impl Default for SprocketForm {
    fn default() -> Self {
        SprocketForm::new()
    }
}

impl SprocketForm {
    /// Empty form with every unit selector on millimeters
    pub fn new() -> Self {
        let measurements = MeasurementField::ALL
            .into_iter()
            .map(|field| (field, MeasurementInput::empty(field)))
            .collect();
        SprocketForm {
            chain_type: String::new(),
            number_of_teeth: None,
            measurements,
            pcd_mode: PcdMode::Automatic,
            rates: CostRates::default(),
        }
    }

    /// Build a form from flat key/value pairs, as a browser form would post them.
    ///
    /// Recognised keys are the measurement keys (`chainPitch`, `od`, ...), the
    /// same keys suffixed with `Unit`, `numberOfTeeth`, `chainType`,
    /// `pcdOption` (`auto` / `manual`) and the rate keys. Any other key is
    /// rejected.
    pub fn from_pairs<'a, I>(pairs: I) -> CalcResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut form = SprocketForm::new();
        let mut texts: Vec<(MeasurementField, &str)> = Vec::new();

        for (key, value) in pairs {
            match key {
                "numberOfTeeth" => form.number_of_teeth = parse_optional(value),
                "chainType" => form.chain_type = value.trim().to_string(),
                "pcdOption" => {
                    form.pcd_mode = match value.trim().to_ascii_lowercase().as_str() {
                        "manual" => PcdMode::Manual,
                        "auto" | "automatic" | "" => PcdMode::Automatic,
                        other => {
                            return Err(CalcError::invalid_input("pcdOption", other, "Expected 'auto' or 'manual'"))
                        }
                    }
                }
                _ => {
                    if let Some(field_key) = key.strip_suffix("Unit") {
                        let field: MeasurementField = field_key.parse()?;
                        let unit: LengthUnit = value.parse()?;
                        form.measurement_mut(field).unit = unit;
                    } else if let Ok(rate) = key.parse::<RateField>() {
                        form.rates.set(rate, parse_optional(value));
                    } else {
                        texts.push((key.parse()?, value));
                    }
                }
            }
        }

        // Values are read after units so key order does not matter
        for (field, text) in texts {
            form.measurement_mut(field).raw_value = parse_optional(text);
        }

        Ok(form)
    }

    pub fn measurement(&self, field: MeasurementField) -> MeasurementInput {
        self.measurements
            .get(&field)
            .copied()
            .unwrap_or_else(|| MeasurementInput::empty(field))
    }

    fn measurement_mut(&mut self, field: MeasurementField) -> &mut MeasurementInput {
        self.measurements
            .entry(field)
            .or_insert_with(|| MeasurementInput::empty(field))
    }

    /// Set a measurement directly (value already parsed)
    pub fn set_measurement(&mut self, field: MeasurementField, value: Option<f64>, unit: LengthUnit) {
        *self.measurement_mut(field) = MeasurementInput::new(field, value, unit);
    }

    /// Apply one edit and report what changed.
    pub fn apply(&mut self, edit: FormEdit) -> FormUpdate {
        let affects_pcd = match &edit {
            FormEdit::Measurement { field, .. } | FormEdit::Unit { field, .. } => {
                *field == MeasurementField::ChainPitch
            }
            FormEdit::Teeth(_) => true,
            _ => false,
        };

        match edit {
            FormEdit::Measurement { field, text } => {
                self.measurement_mut(field).raw_value = parse_optional(&text);
            }
            FormEdit::Unit { field, unit } => {
                let input = self.measurement_mut(field);
                let from = input.unit;
                // Keep the physical length: 25.4 mm becomes 1 inch, not 25.4 inches
                input.raw_value = input.raw_value.map(|v| convert(v, from, unit));
                input.unit = unit;
            }
            FormEdit::Teeth(text) => self.number_of_teeth = parse_optional(&text),
            FormEdit::ChainType(text) => self.chain_type = text.trim().to_string(),
            FormEdit::SelectPcd(mode) => self.pcd_mode = mode,
            FormEdit::Rate { rate, text } => self.rates.set(rate, parse_optional(&text)),
        }

        if affects_pcd {
            let suggestion = self.automatic_pcd();
            debug!(pcd = suggestion, "recomputed automatic PCD");
            FormUpdate { pcd_suggestion: Some(suggestion) }
        } else {
            FormUpdate::default()
        }
    }

    /// Automatic PCD from the current chain pitch and tooth count (mm)
    pub fn automatic_pcd(&self) -> f64 {
        compute_automatic_pcd(
            self.measurement(MeasurementField::ChainPitch).canonical(),
            sanitize(self.number_of_teeth),
        )
    }

    /// PCD selection as it would be submitted
    pub fn pcd_selection(&self) -> PcdSelection {
        match self.pcd_mode {
            PcdMode::Automatic => PcdSelection::Automatic,
            PcdMode::Manual => {
                let manual = self.measurement(MeasurementField::ManualPcd);
                PcdSelection::Manual {
                    value: manual.raw_value,
                    unit: manual.unit,
                }
            }
        }
    }

    /// Normalize the form into a submission. Never fails.
    pub fn submit(&self) -> Submission {
        let inputs: Vec<MeasurementInput> = MeasurementField::ALL
            .into_iter()
            .map(|field| self.measurement(field))
            .collect();
        let selection = self.pcd_selection();
        let teeth = self.number_of_teeth.unwrap_or(0.0);

        let request = normalize(&inputs, &selection, teeth).with_context(self.chain_type.clone(), self.rates);
        Submission::new(request, inputs, self.number_of_teeth, selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcd_suggestion_on_pitch_and_teeth() {
        let mut form = SprocketForm::new();
        let update = form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        assert_eq!(update.pcd_suggestion, Some(0.0));

        let update = form.apply(FormEdit::Teeth("40".to_string()));
        let pcd = update.pcd_suggestion.unwrap();
        assert!((pcd - 161.70).abs() < 0.005);
    }

    #[test]
    fn test_other_edits_do_not_recompute() {
        let mut form = SprocketForm::new();
        let update = form.apply(FormEdit::measurement(MeasurementField::OuterDiameter, "170"));
        assert_eq!(update.pcd_suggestion, None);
        let update = form.apply(FormEdit::ChainType("Duplex".to_string()));
        assert_eq!(update.pcd_suggestion, None);
    }

    #[test]
    fn test_suggestion_recomputed_in_manual_mode() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::SelectPcd(PcdMode::Manual));
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        let update = form.apply(FormEdit::Teeth("40".to_string()));
        assert!(update.pcd_suggestion.unwrap() > 161.0);
    }

    #[test]
    fn test_unit_change_keeps_length() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::OuterDiameter, "25.4"));
        form.apply(FormEdit::unit(MeasurementField::OuterDiameter, LengthUnit::Inches));

        let od = form.measurement(MeasurementField::OuterDiameter);
        assert_eq!(od.unit, LengthUnit::Inches);
        assert!((od.raw_value.unwrap() - 1.0).abs() < 1e-12);
        assert!((od.canonical() - 25.4).abs() < 1e-12);
    }

    #[test]
    fn test_pitch_unit_change_keeps_suggestion() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        form.apply(FormEdit::Teeth("40".to_string()));
        let update = form.apply(FormEdit::unit(MeasurementField::ChainPitch, LengthUnit::Inches));
        assert!((update.pcd_suggestion.unwrap() - 161.70).abs() < 0.005);
    }

    #[test]
    fn test_submit_manual_pcd() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        form.apply(FormEdit::Teeth("40".to_string()));
        form.apply(FormEdit::SelectPcd(PcdMode::Manual));
        form.apply(FormEdit::unit(MeasurementField::ManualPcd, LengthUnit::Inches));
        form.apply(FormEdit::measurement(MeasurementField::ManualPcd, "100"));

        let submission = form.submit();
        assert_eq!(submission.request.pcd, 2540.0);
        assert_eq!(submission.input(MeasurementField::ManualPcd).unit, LengthUnit::Inches);
    }

    #[test]
    fn test_submit_manual_without_value() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        form.apply(FormEdit::Teeth("40".to_string()));
        form.apply(FormEdit::SelectPcd(PcdMode::Manual));
        assert_eq!(form.submit().request.pcd, 0.0);
    }

    #[test]
    fn test_from_pairs() {
        let form = SprocketForm::from_pairs([
            ("chainPitch", "0.5"),
            ("chainPitchUnit", "inches"),
            ("numberOfTeeth", "40"),
            ("chainType", "Simplex"),
            ("od", "170"),
            ("sprocketRmcPerKg", "95"),
            ("pcdOption", "auto"),
        ])
        .unwrap();

        let submission = form.submit();
        assert!((submission.request.chain_pitch - 12.7).abs() < 1e-9);
        assert_eq!(submission.request.outer_diameter, 170.0);
        assert_eq!(submission.request.rates.sprocket_rmc_per_kg, 95.0);
        assert_eq!(submission.request.chain_type, "Simplex");
    }

    #[test]
    fn test_from_pairs_rejects_typos() {
        let err = SprocketForm::from_pairs([("chainPich", "12.7")]).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_FIELD");

        let err = SprocketForm::from_pairs([("odUnit", "cubits")]).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_UNIT");
    }

    #[test]
    fn test_garbage_rates_default_to_zero() {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::rate(RateField::HubHt, "n/a"));
        form.apply(FormEdit::rate(RateField::HubPc, "-10"));
        let request = form.submit().request;
        assert_eq!(request.rates.hub_ht, 0.0);
        assert_eq!(request.rates.hub_pc, 0.0);
    }
}
