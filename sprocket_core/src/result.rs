//! # Calculation Result Contract
//!
//! What the calculation service sends back. This crate does not compute
//! these numbers on the client side; it receives them, stores the latest one,
//! and formats it for display and export.
//!
//! ## Envelope
//!
//! ```json
//! { "success": true,  "data": { "product_name": "12.7X40 Simplex", "...": "..." } }
//! { "success": false, "error": "could not convert string to float" }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Cost breakdown for one machined component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentCost {
    /// Raw bar diameter (mm)
    pub raw_size: f64,
    /// Raw bar length (mm)
    pub length: f64,
    #[serde(rename = "rmc_per_kg")]
    pub cost_per_kg: f64,
    #[serde(rename = "rmc")]
    pub raw_material_cost: f64,
    #[serde(rename = "pc")]
    pub processing_cost: f64,
    #[serde(rename = "ht")]
    pub heat_treatment_cost: f64,
    /// RMC + PC + HT
    pub production_cost: f64,
}

/// Component identifiers in the breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Sprocket,
    Hub,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 2] = [ComponentKind::Sprocket, ComponentKind::Hub];

    pub fn display_name(self) -> &'static str {
        match self {
            ComponentKind::Sprocket => "Sprocket",
            ComponentKind::Hub => "Hub",
        }
    }
}

/// Breakdown keyed by component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    pub sprocket: ComponentCost,
    pub hub: ComponentCost,
}

impl Components {
    pub fn get(&self, kind: ComponentKind) -> &ComponentCost {
        match kind {
            ComponentKind::Sprocket => &self.sprocket,
            ComponentKind::Hub => &self.hub,
        }
    }

    /// Components in display order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &ComponentCost)> {
        ComponentKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// One row of the price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub selling_price: f64,
    /// Margin as displayed, e.g. "40%"
    #[serde(rename = "margin")]
    pub margin_label: String,
    /// Selling price including GST
    #[serde(rename = "net_price")]
    pub net_price_incl_tax: f64,
}

/// Result of one cost calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub product_name: String,
    pub pcd_mm: f64,
    pub components: Components,
    pub total_production_cost: f64,
    pub price_chart: Vec<PriceTier>,
}

/// Response envelope of the calculation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CalculationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceEnvelope {
    pub fn ok(result: CalculationResult) -> Self {
        ServiceEnvelope {
            success: true,
            data: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ServiceEnvelope {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Unwrap the envelope into a result or a `ServiceFailure`.
    pub fn into_result(self) -> CalcResult<CalculationResult> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(CalcError::MalformedResponse {
                reason: "success reported without data".to_string(),
            }),
            (false, _) => Err(CalcError::service_failure(
                self.error.unwrap_or_else(|| "Calculation failed".to_string()),
            )),
        }
    }
}

impl From<CalcResult<CalculationResult>> for ServiceEnvelope {
    fn from(result: CalcResult<CalculationResult>) -> Self {
        match result {
            Ok(data) => ServiceEnvelope::ok(data),
            Err(e) => ServiceEnvelope::failure(e.to_string()),
        }
    }
}
