//! # Session
//!
//! The application controller. A [`Session`] owns the calculation service, the
//! single "current result" slot and the in-flight guard.
//!
//! ## Rules
//!
//! - The slot is overwritten only after a response was fully received and
//!   parsed. A failed submission leaves the previous result in place.
//! - One submission at a time. A second `submit` while one is outstanding is
//!   rejected with [`CalcError::SubmissionInFlight`]; the first is not cancelled.
//! - Exports read the slot. With no result stored they fail with
//!   [`CalcError::NoResult`] before anything is rendered or written.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::export::{write_export, ExportKind};
use crate::form::SprocketForm;
use crate::request::Submission;
use crate::result::CalculationResult;
use crate::service::CalculationService;
use crate::{pdf, spreadsheet};

/// A successful calculation together with the submission that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub submission: Submission,
    pub result: CalculationResult,
}

// ============================================================================
// Result slot
// ============================================================================

/// Holds at most one [`StoredResult`].
#[derive(Debug, Default)]
pub struct ResultSlot {
    inner: Mutex<Option<StoredResult>>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored result
    pub fn set(&self, stored: StoredResult) {
        *self.lock() = Some(stored);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Copy of the stored result, if any
    pub fn get(&self) -> Option<StoredResult> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredResult>> {
        // The slot is only ever assigned whole, a poisoned value is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag when dropped
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> CalcResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard { flag })
            .map_err(|_| CalcError::SubmissionInFlight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ============================================================================
// Session
// ============================================================================

/// Submission and export controller over a [`CalculationService`].
#[derive(Debug)]
pub struct Session<S> {
    service: S,
    slot: ResultSlot,
    in_flight: AtomicBool,
}

impl<S: CalculationService> Session<S> {
    pub fn new(service: S) -> Self {
        Session {
            service,
            slot: ResultSlot::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Whether a submission is currently outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Normalize the form, send it, and store the result on success.
    pub async fn submit(&self, form: &SprocketForm) -> CalcResult<StoredResult> {
        self.submit_prepared(form.submit()).await
    }

    /// Send an already normalized submission.
    pub async fn submit_prepared(&self, submission: Submission) -> CalcResult<StoredResult> {
        let _guard = InFlightGuard::acquire(&self.in_flight).inspect_err(|_| {
            warn!(submission = %submission.id, "rejected submission while another is in flight");
        })?;

        info!(
            submission = %submission.id,
            service = self.service.name(),
            "submitting calculation"
        );

        let result = self.service.calculate(&submission.request).await?;
        let stored = StoredResult { submission, result };
        self.slot.set(stored.clone());

        info!(
            submission = %stored.submission.id,
            product = %stored.result.product_name,
            total = stored.result.total_production_cost,
            "stored calculation result"
        );
        Ok(stored)
    }

    /// The current result, if a calculation has succeeded
    pub fn current(&self) -> Option<StoredResult> {
        self.slot.get()
    }

    pub fn clear(&self) {
        self.slot.clear();
    }

    fn require_result(&self) -> CalcResult<StoredResult> {
        self.slot.get().ok_or(CalcError::NoResult)
    }

    /// Render the PDF report into `dir`. Returns the written path.
    pub fn export_pdf(&self, dir: &Path) -> CalcResult<PathBuf> {
        let stored = self.require_result()?;
        let bytes = pdf::render_report_pdf(&stored)?;
        write_export(dir, ExportKind::Pdf, &stored.result.product_name, &bytes)
    }

    /// Write the workbook into `dir`. Returns the written path.
    pub fn export_spreadsheet(&self, dir: &Path) -> CalcResult<PathBuf> {
        let stored = self.require_result()?;
        let bytes = spreadsheet::render_workbook(&stored)?;
        write_export(dir, ExportKind::Spreadsheet, &stored.result.product_name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormEdit;
    use crate::fields::MeasurementField;
    use crate::request::NormalizedRequest;
    use crate::service::LocalCalculationService;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Local engine that can be switched to fail, and slowed down
    #[derive(Default)]
    struct TestService {
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CalculationService for TestService {
        async fn calculate(&self, request: &NormalizedRequest) -> CalcResult<CalculationResult> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(CalcError::service_failure("x"));
            }
            LocalCalculationService.calculate(request).await
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    fn sample_form() -> SprocketForm {
        let mut form = SprocketForm::new();
        form.apply(FormEdit::measurement(MeasurementField::ChainPitch, "12.7"));
        form.apply(FormEdit::Teeth("40".to_string()));
        form.apply(FormEdit::measurement(MeasurementField::OuterDiameter, "170"));
        form
    }

    #[test]
    fn test_slot_contract() {
        let slot = ResultSlot::new();
        assert!(slot.is_empty());
        assert!(slot.get().is_none());

        let submission = sample_form().submit();
        let result = crate::costing::calculate(&submission.request).unwrap();
        slot.set(StoredResult { submission, result });
        assert!(!slot.is_empty());

        slot.clear();
        assert!(slot.is_empty());
    }

    #[tokio::test]
    async fn test_submit_stores_result() {
        let session = Session::new(TestService::default());
        let stored = session.submit(&sample_form()).await.unwrap();

        assert_eq!(stored.result.product_name, "12.7X40");
        assert_eq!(session.current(), Some(stored));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        crate::logging::init_test();
        let session = Session::new(TestService::default());
        let first = session.submit(&sample_form()).await.unwrap();

        session.service().fail.store(true, Ordering::SeqCst);
        let mut changed = sample_form();
        changed.apply(FormEdit::Teeth("17".to_string()));
        let err = session.submit(&changed).await.unwrap_err();

        assert_eq!(err.user_message(), "x");
        assert_eq!(session.current(), Some(first));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_in_flight() {
        let session = Session::new(TestService {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let form = sample_form();

        let (first, second) = tokio::join!(session.submit(&form), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.submit(&form).await
        });

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), CalcError::SubmissionInFlight);

        // Guard released once the first completes
        assert!(session.submit(&form).await.is_ok());
    }

    #[test]
    fn test_export_without_result() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(LocalCalculationService);

        assert_eq!(session.export_pdf(dir.path()).unwrap_err(), CalcError::NoResult);
        assert_eq!(session.export_spreadsheet(dir.path()).unwrap_err(), CalcError::NoResult);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_spreadsheet_after_submit() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(LocalCalculationService);
        session.submit(&sample_form()).await.unwrap();

        let path = session.export_spreadsheet(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "12.7X40_report.xlsx");
        assert!(path.exists());

        session.clear();
        assert_eq!(session.export_spreadsheet(dir.path()).unwrap_err(), CalcError::NoResult);
    }
}
