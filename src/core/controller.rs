use crate::core::dispatcher::NotificationDispatcher;
use crate::core::reducer::OutcomeReducer;
use crate::core::store::{PersistenceError, StoreResult, SubmissionStore};
use crate::core::validator::{self, ValidationError};
use crate::domain::outcome::Outcome;
use crate::domain::submission::{ClientContext, SubmissionInput, SubmissionRecord};
use opentelemetry::{KeyValue, global, metrics::Counter};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Idle,
    Validating,
    Persisting,
    Dispatching,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("already submitting")]
    AlreadySubmitting,
}

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
    store_writes_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("portfolio-contact");
        Self {
            submissions_total: meter
                .u64_counter("contact_submissions_total")
                .with_description("Contact submissions by terminal outcome")
                .build(),
            store_writes_total: meter
                .u64_counter("contact_store_writes_total")
                .with_description("Submission store writes by result")
                .build(),
        }
    }
}

/// The stateless half of the pipeline, shared by every controller.
#[derive(Debug)]
pub struct SubmissionPipeline {
    store: Arc<dyn SubmissionStore>,
    dispatcher: NotificationDispatcher,
    reducer: OutcomeReducer,
    source: String,
    persist_timeout: Duration,
    metrics: Metrics,
}

impl SubmissionPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        dispatcher: NotificationDispatcher,
        reducer: OutcomeReducer,
        source: impl Into<String>,
        persist_timeout: Duration,
    ) -> Self {
        Self { store, dispatcher, reducer, source: source.into(), persist_timeout, metrics: Metrics::new() }
    }

    async fn persist(&self, record: &SubmissionRecord) -> StoreResult {
        let result = match tokio::time::timeout(self.persist_timeout, self.store.persist(record)).await {
            Ok(res) => res,
            Err(_) => Err(PersistenceError::Timeout(u64::try_from(self.persist_timeout.as_millis()).unwrap_or(u64::MAX))),
        };

        match &result {
            Ok(id) => {
                tracing::info!(submission_id = %id, "Submission persisted");
                self.metrics.store_writes_total.add(1, &[KeyValue::new("status", "ok")]);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist submission");
                self.metrics.store_writes_total.add(1, &[KeyValue::new("status", e.label())]);
            }
        }
        result
    }
}

/// Resets the controller to idle however `submit` exits, including unwinding and
/// cancellation of the future.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmissionState>,
}

impl InFlight<'_> {
    fn advance(&self, next: SubmissionState) {
        self.state.send_replace(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_replace(SubmissionState::Idle);
    }
}

/// Runs one submission at a time through validate, persist, dispatch and reduce.
#[derive(Debug)]
pub struct SubmissionController {
    pipeline: Arc<SubmissionPipeline>,
    state: watch::Sender<SubmissionState>,
}

impl SubmissionController {
    #[must_use]
    pub fn new(pipeline: Arc<SubmissionPipeline>) -> Self {
        Self { pipeline, state: watch::Sender::new(SubmissionState::Idle) }
    }

    #[must_use]
    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.state() != SubmissionState::Idle
    }

    /// Read-only stream of state changes, for callers that gate UI on `is_submitting`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        let started = self.state.send_if_modified(|state| {
            if *state == SubmissionState::Idle {
                *state = SubmissionState::Validating;
                true
            } else {
                false
            }
        });
        started.then_some(InFlight { state: &self.state })
    }

    /// Submits one contact-form entry.
    ///
    /// Store and notification failures are folded into the returned [`Outcome`]; only
    /// problems the visitor must fix themselves come back as errors.
    ///
    /// # Errors
    /// Returns `SubmitError::AlreadySubmitting` if a submission is already in flight and
    /// `SubmitError::Validation` if the input is rejected. Neither performs any I/O.
    #[tracing::instrument(skip_all, fields(outcome = tracing::field::Empty))]
    pub async fn submit(&self, input: SubmissionInput, client: ClientContext) -> Result<Outcome, SubmitError> {
        let Some(in_flight) = self.begin() else {
            tracing::debug!("Rejected submission while another is in flight");
            return Err(SubmitError::AlreadySubmitting);
        };

        let valid = validator::validate(&input).inspect_err(|e| {
            tracing::debug!(field = e.field.as_str(), reason = ?e.reason, "Submission failed validation");
        })?;

        let record = SubmissionRecord::new(valid, client, &self.pipeline.source);
        tracing::debug!(fingerprint = %record.fingerprint, "Submission validated");

        in_flight.advance(SubmissionState::Persisting);
        let stored = self.pipeline.persist(&record).await;

        let report = if stored.is_ok() {
            in_flight.advance(SubmissionState::Dispatching);
            Some(self.pipeline.dispatcher.dispatch_all(&record).await)
        } else {
            None
        };

        let outcome = self.pipeline.reducer.reduce(&stored, report.as_ref());
        tracing::Span::current().record("outcome", outcome.kind.as_str());
        tracing::info!(outcome = %outcome.kind, "Submission completed");
        self.pipeline.metrics.submissions_total.add(1, &[KeyValue::new("outcome", outcome.kind.as_str())]);

        drop(in_flight);
        Ok(outcome)
    }
}
