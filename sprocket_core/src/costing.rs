//! # Cost Engine
//!
//! The calculation behind the calculation service: raw material, processing
//! and heat treatment cost for the sprocket and the hub, and a price chart at
//! fixed margins. The HTTP server and [`crate::service::LocalCalculationService`]
//! both run this.
//!
//! ## Raw Material Cost
//!
//! Both components are turned from round bar. The bar is oversized by a
//! machining allowance and its mass is estimated with the steel factor
//! `0.0062 kg / (mm² · m)`:
//!
//! ```text
//! RMC = 0.0062 × raw_size² × (length / 1000) × rate_per_kg
//! ```
//!
//! | Component | Raw size        | Length          |
//! |-----------|-----------------|-----------------|
//! | Sprocket  | OD + 10 mm      | ZZ + 7 mm       |
//! | Hub       | Hub dia + 15 mm | Hub length + 7 mm |
//!
//! ## Price Chart
//!
//! Selling price = total production cost × (1.4 … 1.8), net price adds 18% GST.
//! All service output is rounded to 2 decimals.

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::request::NormalizedRequest;
use crate::result::{CalculationResult, ComponentCost, Components, PriceTier};

/// Bar mass factor, kg per mm² of diameter² per metre of length
pub const STEEL_MASS_FACTOR: f64 = 0.0062;

/// Diameter allowance on the sprocket blank (mm)
pub const SPROCKET_DIAMETER_ALLOWANCE_MM: f64 = 10.0;
/// Diameter allowance on the hub blank (mm)
pub const HUB_DIAMETER_ALLOWANCE_MM: f64 = 15.0;
/// Facing allowance on both blanks (mm)
pub const LENGTH_ALLOWANCE_MM: f64 = 7.0;

/// GST multiplier applied to the selling price
pub const GST_MULTIPLIER: f64 = 1.18;

/// Selling price multipliers and their margin labels
pub const MARGIN_TIERS: [(f64, &str); 5] = [
    (1.4, "40%"),
    (1.5, "50%"),
    (1.6, "60%"),
    (1.7, "70%"),
    (1.8, "80%"),
];

/// Round to 2 decimals, as the service reports money and sizes
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Raw material cost of a bar blank
pub fn raw_material_cost(raw_size_mm: f64, length_mm: f64, rate_per_kg: f64) -> f64 {
    STEEL_MASS_FACTOR * raw_size_mm * raw_size_mm * (length_mm / 1000.0) * rate_per_kg
}

/// Cost of one component, unrounded
fn component_cost(raw_size: f64, length: f64, rate_per_kg: f64, pc: f64, ht: f64) -> ComponentCost {
    let rmc = raw_material_cost(raw_size, length, rate_per_kg);
    ComponentCost {
        raw_size,
        length,
        cost_per_kg: rate_per_kg,
        raw_material_cost: rmc,
        processing_cost: pc,
        heat_treatment_cost: ht,
        production_cost: rmc + pc + ht,
    }
}

fn rounded(cost: ComponentCost) -> ComponentCost {
    ComponentCost {
        raw_size: round2(cost.raw_size),
        length: round2(cost.length),
        raw_material_cost: round2(cost.raw_material_cost),
        production_cost: round2(cost.production_cost),
        ..cost
    }
}

/// Product name, e.g. `"12.7X40 Simplex"`
pub fn product_name(chain_pitch_mm: f64, number_of_teeth: u32, chain_type: &str) -> String {
    format!("{:.1}X{} {}", chain_pitch_mm, number_of_teeth, chain_type.trim())
        .trim_end()
        .to_string()
}

/// Price chart for a total production cost (unrounded input)
pub fn price_chart(total_production_cost: f64) -> Vec<PriceTier> {
    MARGIN_TIERS
        .iter()
        .map(|&(multiplier, label)| {
            let selling_price = total_production_cost * multiplier;
            PriceTier {
                selling_price: round2(selling_price),
                margin_label: label.to_string(),
                net_price_incl_tax: round2(selling_price * GST_MULTIPLIER),
            }
        })
        .collect()
}

/// Compute the full cost result for a normalized request.
///
/// # Errors
///
/// `InvalidInput` when any length or rate is negative or non-finite.
pub fn calculate(request: &NormalizedRequest) -> CalcResult<CalculationResult> {
    request.validate()?;
    let rates = &request.rates;

    let sprocket = component_cost(
        request.outer_diameter + SPROCKET_DIAMETER_ALLOWANCE_MM,
        request.zz + LENGTH_ALLOWANCE_MM,
        rates.sprocket_rmc_per_kg,
        rates.sprocket_pc,
        rates.sprocket_ht,
    );
    let hub = component_cost(
        request.hub_diameter + HUB_DIAMETER_ALLOWANCE_MM,
        request.hub_length + LENGTH_ALLOWANCE_MM,
        rates.hub_rmc_per_kg,
        rates.hub_pc,
        rates.hub_ht,
    );
    let total = sprocket.production_cost + hub.production_cost;

    if !total.is_finite() {
        return Err(CalcError::invalid_input(
            "total_production_cost",
            total.to_string(),
            "Inputs are too large to produce a finite cost",
        ));
    }

    let name = product_name(request.chain_pitch, request.number_of_teeth, &request.chain_type);
    debug!(product = %name, total, "computed production cost");

    Ok(CalculationResult {
        product_name: name,
        pcd_mm: round2(request.pcd),
        components: Components {
            sprocket: rounded(sprocket),
            hub: rounded(hub),
        },
        total_production_cost: round2(total),
        price_chart: price_chart(total),
    })
}
