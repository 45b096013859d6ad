//! Field Validation Coordinator
//!
//! Validates entered values as the analyst types. Every `(sample, parameter)`
//! key carries a monotonic sequence number; a new submission aborts the
//! in-flight task for its key, and a completion whose sequence is no longer
//! the latest is discarded instead of applied.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use labqc_utils::spec::{validate, ValidationOutcome};
use labqc_utils::{log_error, LabQcResult};

use crate::service::SampleWorkflowService;

type FieldKey = (String, String);

/// A completed, current validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidation {
    pub sample_id: String,
    pub param_id: String,
    pub sequence: u64,
    pub raw_value: String,
    pub outcome: ValidationOutcome,
}

/// Handle to one submitted validation.
pub struct ValidationTicket {
    pub sequence: u64,
    handle: JoinHandle<Option<FieldValidation>>,
}

impl ValidationTicket {
    /// Waits for the task. `None` when it was superseded or cancelled.
    pub async fn wait(self) -> Option<FieldValidation> {
        self.handle.await.ok().flatten()
    }
}

#[derive(Default)]
struct CoordinatorState {
    sequences: HashMap<FieldKey, u64>,
    in_flight: HashMap<FieldKey, AbortHandle>,
}

#[derive(Clone, Default)]
pub struct FieldValidationCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    debounce: Duration,
}

impl FieldValidationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before a submitted value is evaluated.
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    /// Starts validating `raw_value` and supersedes any earlier submission
    /// for the same key. `apply` runs only if this submission is still the
    /// latest when it completes.
    pub async fn submit_value<F>(
        &self,
        sample_id: &str,
        param_id: &str,
        raw_value: impl Into<String>,
        expression: impl Into<String>,
        apply: F,
    ) -> ValidationTicket
    where
        F: FnOnce(&FieldValidation) + Send + 'static,
    {
        let key: FieldKey = (sample_id.to_string(), param_id.to_string());
        let raw_value = raw_value.into();
        let expression = expression.into();

        let mut state = self.state.lock().await;
        let sequence = {
            let counter = state.sequences.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        if let Some(previous) = state.in_flight.remove(&key) {
            previous.abort();
            debug!(sample_id, param_id, sequence, "Superseded in-flight validation");
        }

        let shared = Arc::clone(&self.state);
        let debounce = self.debounce;
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let outcome = validate(&raw_value, &expression);

            let mut state = shared.lock().await;
            if state.sequences.get(&task_key) != Some(&sequence) {
                debug!(
                    sample_id = %task_key.0,
                    param_id = %task_key.1,
                    sequence,
                    "Discarding stale validation"
                );
                return None;
            }
            state.in_flight.remove(&task_key);

            let (sample_id, param_id) = task_key;
            let validation = FieldValidation {
                sample_id,
                param_id,
                sequence,
                raw_value,
                outcome,
            };
            apply(&validation);
            Some(validation)
        });

        state.in_flight.insert(key, handle.abort_handle());
        ValidationTicket { sequence, handle }
    }

    /// Validates an entered result and records it on the sample once current.
    pub async fn submit_result(
        &self,
        service: Arc<SampleWorkflowService>,
        sample_id: &str,
        param_id: &str,
        raw_value: impl Into<String>,
    ) -> LabQcResult<ValidationTicket> {
        let expression = service.expression_for(sample_id, param_id)?;

        let ticket = self
            .submit_value(sample_id, param_id, raw_value, expression, move |validation| {
                if let Err(e) = service.record_result(
                    &validation.sample_id,
                    &validation.param_id,
                    &validation.raw_value,
                ) {
                    log_error!(
                        e,
                        "Failed to record validated result",
                        sample_id = %validation.sample_id,
                        param_id = %validation.param_id
                    );
                }
            })
            .await;

        Ok(ticket)
    }

    pub async fn latest_sequence(&self, sample_id: &str, param_id: &str) -> Option<u64> {
        let key = (sample_id.to_string(), param_id.to_string());
        self.state.lock().await.sequences.get(&key).copied()
    }

    pub async fn is_current(&self, sample_id: &str, param_id: &str, sequence: u64) -> bool {
        self.latest_sequence(sample_id, param_id).await == Some(sequence)
    }

    /// Aborts every in-flight validation of a sample. Returns how many were
    /// cancelled.
    pub async fn cancel_all(&self, sample_id: &str) -> usize {
        let mut state = self.state.lock().await;

        let keys: Vec<FieldKey> = state
            .in_flight
            .keys()
            .filter(|(sample, _)| sample == sample_id)
            .cloned()
            .collect();

        for key in &keys {
            if let Some(handle) = state.in_flight.remove(key) {
                handle.abort();
            }
            // Any completion already past its abort point is now stale.
            if let Some(counter) = state.sequences.get_mut(key) {
                *counter += 1;
            }
        }

        if !keys.is_empty() {
            debug!(sample_id, cancelled = keys.len(), "Cancelled field validations");
        }
        keys.len()
    }

    /// Drops all ordering state of a sample once no more values will be
    /// entered for it, aborting anything still in flight. Late completions
    /// find no sequence and are discarded.
    pub async fn forget(&self, sample_id: &str) {
        let mut state = self.state.lock().await;

        state.in_flight.retain(|(sample, _), handle| {
            if sample == sample_id {
                handle.abort();
                false
            } else {
                true
            }
        });
        state.sequences.retain(|(sample, _), _| sample != sample_id);

        debug!(sample_id, "Forgot field validation state");
    }

    /// Number of `(sample, parameter)` keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.sequences.len()
    }
}
