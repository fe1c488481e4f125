//! # Error Types
//!
//! Structured error types for sprocket_core. Normalization never produces an
//! error (missing or garbage input is defaulted to `0.0`), so the variants here
//! cover the boundaries: schema lookups, the calculation service, the
//! single-slot session state, and export rendering.
//!
//! ## Example
//!
//! ```rust
//! use sprocket_core::errors::{CalcError, CalcResult};
//!
//! fn require_teeth(teeth: u32) -> CalcResult<()> {
//!     if teeth == 0 {
//!         return Err(CalcError::invalid_input(
//!             "numberOfTeeth",
//!             teeth.to_string(),
//!             "Tooth count must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for sprocket_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Message shown for every transport-level failure of the calculation service.
pub const GENERIC_CALCULATION_FAILURE: &str =
    "An error occurred while calculating. Please try again.";

/// Structured error type for calculation and export operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, non-finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A form key does not name any known measurement field
    #[error("Unknown measurement field: {key}")]
    UnknownField { key: String },

    /// A unit selector value is not recognised
    #[error("Unknown length unit: {unit}")]
    UnknownUnit { unit: String },

    /// The calculation service answered `success: false`
    #[error("Calculation service failed: {reason}")]
    ServiceFailure { reason: String },

    /// The calculation service could not be reached or answered a non-2xx status
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// The calculation service answered with something that is not a valid envelope
    #[error("Malformed service response: {reason}")]
    MalformedResponse { reason: String },

    /// A calculation is already outstanding for this session
    #[error("A calculation is already in progress")]
    SubmissionInFlight,

    /// Export requested before any successful calculation
    #[error("No calculation result available")]
    NoResult,

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Report or workbook rendering failed
    #[error("Render failed ({format}): {reason}")]
    RenderFailed { format: String, reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownField error
    pub fn unknown_field(key: impl Into<String>) -> Self {
        CalcError::UnknownField { key: key.into() }
    }

    /// Create a ServiceFailure error
    pub fn service_failure(reason: impl Into<String>) -> Self {
        CalcError::ServiceFailure {
            reason: reason.into(),
        }
    }

    /// Create a Transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        CalcError::Transport {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a RenderFailed error
    pub fn render_failed(format: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::RenderFailed {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (the user can simply resubmit)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::ServiceFailure { .. }
                | CalcError::Transport { .. }
                | CalcError::MalformedResponse { .. }
                | CalcError::SubmissionInFlight
        )
    }

    /// The single message shown to the user for this error.
    ///
    /// A business failure reported by the service carries its own message;
    /// transport and parse failures collapse into one generic notice.
    pub fn user_message(&self) -> String {
        match self {
            CalcError::ServiceFailure { reason } if !reason.trim().is_empty() => reason.clone(),
            CalcError::ServiceFailure { .. }
            | CalcError::Transport { .. }
            | CalcError::MalformedResponse { .. } => GENERIC_CALCULATION_FAILURE.to_string(),
            CalcError::NoResult => "No results to export. Please calculate first.".to_string(),
            CalcError::SubmissionInFlight => "A calculation is already in progress.".to_string(),
            other => other.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::UnknownField { .. } => "UNKNOWN_FIELD",
            CalcError::UnknownUnit { .. } => "UNKNOWN_UNIT",
            CalcError::ServiceFailure { .. } => "SERVICE_FAILURE",
            CalcError::Transport { .. } => "TRANSPORT_ERROR",
            CalcError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            CalcError::SubmissionInFlight => "SUBMISSION_IN_FLIGHT",
            CalcError::NoResult => "NO_RESULT",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::RenderFailed { .. } => "RENDER_FAILED",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
