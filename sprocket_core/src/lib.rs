//! # sprocket_core - Sprocket and Hub Cost Estimation
//!
//! `sprocket_core` turns user-entered sprocket dimensions into a manufacturing
//! cost estimate and price chart. Every measurement may be entered in
//! millimeters or inches; the core normalizes them to millimeters, derives the
//! pitch circle diameter (PCD), sends the request to a calculation service
//! and keeps the latest result for display and export.
//!
//! ## Design Philosophy
//!
//! - **Total normalization**: missing or garbage input becomes `0.0`, never an error
//! - **Fixed schema**: measurement fields are an enum, not free-form keys
//! - **JSON-First**: requests and results are serde types matching the service wire format
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use sprocket_core::fields::MeasurementField;
//! use sprocket_core::form::{FormEdit, SprocketForm};
//! use sprocket_core::units::LengthUnit;
//!
//! let mut form = SprocketForm::new();
//! form.apply(FormEdit::unit(MeasurementField::ChainPitch, LengthUnit::Inches));
//! form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "0.5"));
//! form.apply(FormEdit::Teeth("40".to_string()));
//!
//! let submission = form.submit();
//! assert_eq!(submission.request.chain_pitch, 12.7);
//! assert!((submission.request.pcd - 161.70).abs() < 0.01);
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Millimeter/inch conversion and input sanitizing
//! - [`fields`] - The measurement field schema
//! - [`pcd`] - Pitch circle diameter derivation
//! - [`form`] - Raw form state and reactive PCD suggestion
//! - [`request`] - Request normalization
//! - [`result`] - Calculation result and service envelope
//! - [`costing`] - The cost engine behind the calculation service
//! - [`service`] - HTTP and in-process calculation service clients
//! - [`session`] - Submission controller and current-result slot
//! - [`presenter`] - Display formatting
//! - [`pdf`], [`spreadsheet`], [`export`] - Report artifacts
//! - [`errors`] - Structured error types
//! - [`logging`] - tracing subscriber setup

pub mod costing;
pub mod errors;
pub mod export;
pub mod fields;
pub mod form;
pub mod logging;
pub mod pcd;
pub mod pdf;
pub mod presenter;
pub mod request;
pub mod result;
pub mod service;
pub mod session;
pub mod spreadsheet;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use fields::{MeasurementField, MeasurementInput};
pub use form::{FormEdit, PcdMode, SprocketForm};
pub use pcd::PcdSelection;
pub use request::{normalize, CostRates, NormalizedRequest, RateField, Submission};
pub use result::{CalculationResult, ServiceEnvelope};
pub use service::{CalculationService, HttpCalculationService, LocalCalculationService};
pub use session::{Session, StoredResult};
pub use units::LengthUnit;
