//! # Result Presenter
//!
//! Turns a [`StoredResult`] into display strings. This is the only place
//! values are rounded to 2 decimals; the CLI, the PDF report and the
//! spreadsheet all read a [`ResultView`] instead of formatting on their own.
//!
//! Measurements are shown in the unit the user typed them in
//! (`"0.50 inches"`), taken from the raw inputs kept on the submission.

use std::fmt::Write as _;

use serde::Serialize;

use crate::fields::MeasurementField;
use crate::pcd::{compute_automatic_pcd, compute_chordal_pcd, PcdSelection};
use crate::session::StoredResult;
use crate::units::{sanitize, LengthUnit};

/// Currency prefix used on every amount
pub const CURRENCY_PREFIX: &str = "Rs.";

/// Column headers of the component table
pub const COMPONENT_HEADERS: [&str; 8] = [
    "Component",
    "RAW SIZE (mm)",
    "LENGTH (mm)",
    "RMC/KG",
    "RMC",
    "PC",
    "HT",
    "Production Cost",
];

/// Column headers of the price table
pub const PRICE_HEADERS: [&str; 3] = ["Selling Price", "Profit Margin", "Net Price (incl. 18% GST)"];

/// Measurement fields listed under product information, in report order
const INFO_FIELDS_BEFORE_PCD: [MeasurementField; 2] =
    [MeasurementField::ChainPitch, MeasurementField::ChainRollerDiameter];
const INFO_FIELDS_AFTER_PCD: [MeasurementField; 4] = [
    MeasurementField::OuterDiameter,
    MeasurementField::HubDiameter,
    MeasurementField::HubLength,
    MeasurementField::Zz,
];

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// `"Rs. 1234.50"`
pub fn format_currency(value: f64) -> String {
    format!("{} {:.2}", CURRENCY_PREFIX, value)
}

/// `"25.40 mm"`, `"1.00 inches"`
pub fn format_length(value: f64, unit: LengthUnit) -> String {
    format!("{:.2} {}", value, unit.label())
}

/// Line shown next to the PCD selector while the user types.
///
/// Includes the chordal value so the difference between the two formulas is
/// visible; only the automatic value is ever submitted.
pub fn pcd_preview_line(chain_pitch_mm: f64, number_of_teeth: f64) -> String {
    let automatic = compute_automatic_pcd(chain_pitch_mm, number_of_teeth);
    let chordal = compute_chordal_pcd(chain_pitch_mm, number_of_teeth);
    if chordal > 0.0 {
        format!(
            "Automatic PCD: {} (chordal: {})",
            format_length(automatic, LengthUnit::Millimeters),
            format_length(chordal, LengthUnit::Millimeters)
        )
    } else {
        format!("Automatic PCD: {}", format_length(automatic, LengthUnit::Millimeters))
    }
}

// ============================================================================
// View model
// ============================================================================

/// A labelled value under "Product Information"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoLine {
    pub label: String,
    pub value: String,
}

impl InfoLine {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        InfoLine {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One formatted row of the component table, columns as in [`COMPONENT_HEADERS`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRow {
    pub component: String,
    pub raw_size: String,
    pub length: String,
    pub cost_per_kg: String,
    pub raw_material_cost: String,
    pub processing_cost: String,
    pub heat_treatment_cost: String,
    pub production_cost: String,
}

impl ComponentRow {
    pub fn cells(&self) -> [&str; 8] {
        [
            self.component.as_str(),
            self.raw_size.as_str(),
            self.length.as_str(),
            self.cost_per_kg.as_str(),
            self.raw_material_cost.as_str(),
            self.processing_cost.as_str(),
            self.heat_treatment_cost.as_str(),
            self.production_cost.as_str(),
        ]
    }
}

/// One formatted row of the price table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub selling_price: String,
    pub margin: String,
    pub net_price: String,
}

/// Everything a front end or report needs, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub product_name: String,
    pub product_info: Vec<InfoLine>,
    pub components: Vec<ComponentRow>,
    pub price_chart: Vec<PriceRow>,
    pub total_production_cost: String,
}

impl ResultView {
    pub fn build(stored: &StoredResult) -> Self {
        let submission = &stored.submission;
        let result = &stored.result;

        let measurement_line = |field: MeasurementField| {
            let input = submission.input(field);
            InfoLine::new(field.label(), format_length(input.value(), input.unit))
        };

        let mut product_info = vec![InfoLine::new("Product Name", result.product_name.clone())];
        product_info.extend(INFO_FIELDS_BEFORE_PCD.into_iter().map(measurement_line));
        product_info.push(InfoLine::new(
            "Number of Teeth",
            sanitize(submission.raw_teeth).to_string(),
        ));

        let pcd = format_length(result.pcd_mm, LengthUnit::Millimeters);
        let pcd = match submission.pcd_selection {
            PcdSelection::Manual { value, unit } if unit != LengthUnit::Millimeters => {
                format!("{} (entered as {})", pcd, format_length(sanitize(value), unit))
            }
            _ => pcd,
        };
        product_info.push(InfoLine::new("PCD (Pitch Circle Diameter)", pcd));
        product_info.extend(INFO_FIELDS_AFTER_PCD.into_iter().map(measurement_line));

        let components = result
            .components
            .iter()
            .map(|(kind, cost)| ComponentRow {
                component: kind.display_name().to_string(),
                raw_size: format_amount(cost.raw_size),
                length: format_amount(cost.length),
                cost_per_kg: format_currency(cost.cost_per_kg),
                raw_material_cost: format_currency(cost.raw_material_cost),
                processing_cost: format_currency(cost.processing_cost),
                heat_treatment_cost: format_currency(cost.heat_treatment_cost),
                production_cost: format_currency(cost.production_cost),
            })
            .collect();

        let price_chart = result
            .price_chart
            .iter()
            .map(|tier| PriceRow {
                selling_price: format_currency(tier.selling_price),
                margin: tier.margin_label.clone(),
                net_price: format_currency(tier.net_price_incl_tax),
            })
            .collect();

        ResultView {
            product_name: result.product_name.clone(),
            product_info,
            components,
            price_chart,
            total_production_cost: format_currency(result.total_production_cost),
        }
    }

    /// Plain text rendering for terminals
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "PRODUCT INFORMATION");
        for line in &self.product_info {
            let _ = writeln!(out, "  {}: {}", line.label, line.value);
        }

        let _ = writeln!(out, "\nCOMPONENT COST BREAKDOWN");
        for row in &self.components {
            let _ = writeln!(out, "  {}", row.component);
            for (header, cell) in COMPONENT_HEADERS.iter().zip(row.cells()).skip(1) {
                let _ = writeln!(out, "    {:<16} {}", header, cell);
            }
        }
        let _ = writeln!(out, "  Total Production Cost: {}", self.total_production_cost);

        let _ = writeln!(out, "\nPRICE CHART");
        let _ = writeln!(
            out,
            "  {:<16} {:<14} {}",
            PRICE_HEADERS[0], PRICE_HEADERS[1], PRICE_HEADERS[2]
        );
        for row in &self.price_chart {
            let _ = writeln!(out, "  {:<16} {:<14} {}", row.selling_price, row.margin, row.net_price);
        }

        out
    }
}
