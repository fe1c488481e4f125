//! # Calculation Service Client
//!
//! The cost calculation lives behind [`CalculationService`]. Two
//! implementations ship with the crate:
//!
//! - [`HttpCalculationService`] posts the normalized request to a remote
//!   `/calculate` endpoint and unwraps the `{success, data, error}` envelope.
//! - [`LocalCalculationService`] runs [`crate::costing::calculate`] in-process.
//!
//! Exactly one request is sent per call. There is no retry; every failure is
//! returned to the caller, which decides what the user sees
//! (see [`CalcError::user_message`]).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::costing;
use crate::errors::{CalcError, CalcResult};
use crate::request::NormalizedRequest;
use crate::result::{CalculationResult, ServiceEnvelope};

/// Default request timeout for the HTTP client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Something that turns a normalized request into a cost result.
#[async_trait]
pub trait CalculationService: Send + Sync {
    /// Calculate costs and prices for one request
    async fn calculate(&self, request: &NormalizedRequest) -> CalcResult<CalculationResult>;

    /// Short name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: CalculationService + ?Sized> CalculationService for Box<T> {
    async fn calculate(&self, request: &NormalizedRequest) -> CalcResult<CalculationResult> {
        (**self).calculate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ============================================================================
// HTTP client
// ============================================================================

/// Client for a remote calculation service.
#[derive(Debug, Clone)]
pub struct HttpCalculationService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCalculationService {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str, timeout: Duration) -> CalcResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("SprocketCalculator/{}", CURRENT_VERSION))
            .timeout(timeout)
            .build()
            .map_err(|e| CalcError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(HttpCalculationService {
            client,
            endpoint: format!("{}/calculate", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CalculationService for HttpCalculationService {
    async fn calculate(&self, request: &NormalizedRequest) -> CalcResult<CalculationResult> {
        debug!(endpoint = %self.endpoint, "posting calculation request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "calculation request failed");
                CalcError::transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "calculation service returned an error status");
            return Err(CalcError::transport(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CalcError::transport(e.to_string()))?;

        let envelope: ServiceEnvelope =
            serde_json::from_slice(&body).map_err(|e| CalcError::MalformedResponse {
                reason: e.to_string(),
            })?;

        envelope.into_result().inspect_err(|e| {
            warn!(error = %e, "calculation service reported a failure");
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// In-process
// ============================================================================

/// Runs the cost engine directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalculationService;

#[async_trait]
impl CalculationService for LocalCalculationService {
    async fn calculate(&self, request: &NormalizedRequest) -> CalcResult<CalculationResult> {
        costing::calculate(request)
    }

    fn name(&self) -> &str {
        "local"
    }
}
