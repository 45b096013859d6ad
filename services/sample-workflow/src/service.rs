//! Sample Workflow Service
//!
//! Draft creation, per-parameter result entry, submission and approval.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use labqc_database::{AuditRepository, SampleRepository};
use labqc_models::{
    descriptor, field_ids, AnalysisType, AuditAction, Priority, ProductCategory, ResultStatus,
    ResultValue, Sample, SampleStatus, SpecificationCatalog, TestResult,
};
use labqc_utils::spec::{parse_decimal, validate};
use labqc_utils::{validate_model, LabQcError, LabQcResult, WorkflowConfig};

use crate::state_machine::{Decision, SampleLifecycle};

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

const ENTITY_TYPE: &str = "sample";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    pub category: Option<ProductCategory>,
    #[validate(length(min = 1, max = 100, message = "Analyst name must be 1-100 characters"))]
    pub analyst: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl CreateDraftRequest {
    pub fn new(analysis_type: AnalysisType) -> Self {
        Self {
            analysis_type,
            fields: BTreeMap::new(),
            category: None,
            analyst: None,
            priority: Priority::default(),
        }
    }

    pub fn field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(id.into(), value.into());
        self
    }
}

/// Sample workflow service
pub struct SampleWorkflowService {
    catalog: Arc<SpecificationCatalog>,
    samples: Arc<SampleRepository>,
    audit: Arc<AuditRepository>,
    config: WorkflowConfig,
}

impl SampleWorkflowService {
    pub fn new(
        catalog: Arc<SpecificationCatalog>,
        samples: Arc<SampleRepository>,
        audit: Arc<AuditRepository>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            catalog,
            samples,
            audit,
            config,
        }
    }

    pub fn catalog(&self) -> &SpecificationCatalog {
        &self.catalog
    }

    /// Create a new draft sample
    pub fn create_draft(&self, request: CreateDraftRequest) -> LabQcResult<Sample> {
        self.create_draft_at(request, Utc::now())
    }

    /// Like [`create_draft`](Self::create_draft) with an explicit creation time.
    pub fn create_draft_at(
        &self,
        request: CreateDraftRequest,
        created_at: DateTime<Utc>,
    ) -> LabQcResult<Sample> {
        validate_model(&request)?;
        check_fields(&request.analysis_type, &request.fields)?;

        let millis = created_at.timestamp_millis();
        let prefix = request
            .analysis_type
            .id_prefix()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.fallback_prefix.clone());

        let product = non_blank(request.fields.get("product"))
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        let lot = non_blank(request.fields.get("lot"))
            .unwrap_or_else(|| format!("L-{:03}", millis.rem_euclid(1_000)));

        let mut sample = Sample::new(
            String::new(),
            product,
            lot,
            request.analysis_type,
            created_at,
        );
        sample.category = request.category;
        sample.analyst = request.analyst;
        sample.priority = request.priority;
        sample.fields = request.fields;

        for spec in self.catalog.find(&sample.product, sample.spec_lookup_key()) {
            sample
                .test_results
                .insert(spec.id.clone(), TestResult::pending(spec));
        }
        sample.refresh_verdict();

        let sample = self.insert_with_free_id(sample, &prefix, millis.rem_euclid(10_000))?;

        info!(
            sample_id = %sample.id,
            product = %sample.product,
            analysis_type = %sample.analysis_type,
            "Sample draft created"
        );

        Ok(sample)
    }

    /// Ids are `{prefix}-{suffix}`; the suffix is bumped past ids already taken.
    /// The creation is audited before the sample becomes visible.
    fn insert_with_free_id(&self, mut sample: Sample, prefix: &str, suffix: i64) -> LabQcResult<Sample> {
        for offset in 0..10_000 {
            sample.id = format!("{}-{:04}", prefix, (suffix + offset) % 10_000);

            let inserted = self.samples.insert_with(sample.clone(), |sample| {
                self.audit.record(
                    AuditAction::SampleCreated,
                    ENTITY_TYPE,
                    &sample.id,
                    sample.analyst.clone(),
                    format!(
                        "{} sample created for {} lot {} with {} parameters",
                        sample.analysis_type,
                        sample.product,
                        sample.lot,
                        sample.test_results.len()
                    ),
                )?;
                Ok(())
            });

            match inserted {
                Ok(()) => return Ok(sample),
                Err(LabQcError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(LabQcError::conflict(format!("no free sample id left for prefix {}", prefix)))
    }

    /// Record (or clear) the measured value of one parameter
    pub fn record_result(&self, sample_id: &str, param_id: &str, value: &str) -> LabQcResult<Sample> {
        let catalog = Arc::clone(&self.catalog);

        let sample = self
            .samples
            .update(sample_id, |sample| {
                if sample.status != SampleStatus::Draft {
                    return Err(LabQcError::invalid_transition(
                        &sample.id,
                        sample.status,
                        SampleStatus::Draft,
                    ));
                }

                let (expression, unit) = match catalog.parameter(
                    &sample.product,
                    sample.spec_lookup_key(),
                    param_id,
                ) {
                    Some(spec) => (spec.expression.clone(), spec.unit.clone()),
                    None => match sample.test_results.get(param_id) {
                        Some(existing) => (existing.spec_expression.clone(), existing.unit.clone()),
                        None => {
                            return Err(LabQcError::validation(
                                param_id,
                                format!("not a parameter of sample {}", sample.id),
                            ))
                        }
                    },
                };

                let entered = value.trim();
                let (value, status) = if entered.is_empty() {
                    (ResultValue::empty(), ResultStatus::Pending)
                } else {
                    let outcome = validate(entered, &expression);
                    let value = match parse_decimal(entered) {
                        Some(n) => ResultValue::Number(n),
                        None => ResultValue::Text(entered.to_string()),
                    };
                    (value, outcome.status)
                };

                sample.test_results.insert(
                    param_id.to_string(),
                    TestResult {
                        value,
                        unit,
                        spec_expression: expression,
                        status,
                    },
                );
                sample.refresh_verdict();

                let result = &sample.test_results[param_id];
                self.audit.record(
                    AuditAction::ResultRecorded,
                    ENTITY_TYPE,
                    &sample.id,
                    sample.analyst.clone(),
                    format!(
                        "{} = {} {} against {}: {}",
                        param_id, result.value, result.unit, result.spec_expression, result.status
                    ),
                )?;

                Ok(sample.clone())
            })
            .map_err(|e| refused(sample_id, "record result", e))?;

        let result = &sample.test_results[param_id];
        debug!(
            sample_id = %sample.id,
            param_id,
            value = %result.value,
            status = %result.status,
            "Result recorded"
        );

        Ok(sample)
    }

    /// Submit a draft for approval
    pub fn submit(&self, sample_id: &str) -> LabQcResult<Sample> {
        let require_complete = self.config.require_complete_results;

        let sample = self
            .samples
            .update(sample_id, |sample| {
                let target = SampleStatus::PendingApproval;
                if !sample.status.can_transition_to(target) {
                    return Err(LabQcError::invalid_transition(&sample.id, sample.status, target));
                }

                let pending = sample.pending_parameters();
                if require_complete && !pending.is_empty() {
                    return Err(LabQcError::validation(
                        "testResults",
                        format!("parameters still pending: {}", pending.join(", ")),
                    ));
                }

                sample.refresh_verdict();
                sample.status = target;
                sample.submitted_at = Some(Utc::now());

                self.audit.record(
                    AuditAction::SampleSubmitted,
                    ENTITY_TYPE,
                    &sample.id,
                    sample.analyst.clone(),
                    format!("Submitted for approval: {}", sample.overall_result),
                )?;
                Ok(sample.clone())
            })
            .map_err(|e| refused(sample_id, "submit", e))?;

        info!(sample_id = %sample.id, verdict = %sample.verdict, "Sample submitted for approval");
        Ok(sample)
    }

    /// Approve or reject a submitted sample
    pub fn decide(
        &self,
        sample_id: &str,
        decision: Decision,
        reason: Option<&str>,
    ) -> LabQcResult<Sample> {
        self.decide_as(sample_id, decision, reason, None)
    }

    /// Like [`decide`](Self::decide), recording the reviewer in the audit trail.
    pub fn decide_as(
        &self,
        sample_id: &str,
        decision: Decision,
        reason: Option<&str>,
        reviewer: Option<String>,
    ) -> LabQcResult<Sample> {
        let require_reason = self.config.require_rejection_reason;

        let sample = self
            .samples
            .update(sample_id, |sample| {
                let target = decision.target_status();
                if !sample.status.can_transition_to(target) {
                    return Err(LabQcError::invalid_transition(&sample.id, sample.status, target));
                }

                let reason = reason.map(|r| r.trim().to_string());
                if decision == Decision::Reject {
                    if require_reason && reason.as_deref().unwrap_or_default().is_empty() {
                        return Err(LabQcError::validation(
                            "rejectionReason",
                            "a reason is required to reject a sample",
                        ));
                    }
                    sample.rejection_reason = reason;
                }

                sample.status = target;
                sample.result = decision.result();
                sample.decided_at = Some(Utc::now());

                let details = match &sample.rejection_reason {
                    Some(reason) if !reason.is_empty() => format!("{}: {}", sample.status, reason),
                    _ => sample.status.to_string(),
                };
                self.audit.record(
                    decision.audit_action(),
                    ENTITY_TYPE,
                    &sample.id,
                    reviewer,
                    details,
                )?;
                Ok(sample.clone())
            })
            .map_err(|e| refused(sample_id, "decide", e))?;

        info!(sample_id = %sample.id, decision = %decision, "Sample decided");
        Ok(sample)
    }

    pub fn get_sample(&self, sample_id: &str) -> LabQcResult<Sample> {
        self.samples.fetch(sample_id)
    }

    /// All samples, newest first
    pub fn list_samples(&self) -> LabQcResult<Vec<Sample>> {
        let mut samples = self.samples.list()?;
        samples.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(samples)
    }

    /// Samples awaiting a reviewer's decision, newest first
    pub fn approval_queue(&self) -> LabQcResult<Vec<Sample>> {
        Ok(self
            .list_samples()?
            .into_iter()
            .filter(|s| s.status == SampleStatus::PendingApproval)
            .collect())
    }

    /// Expression a parameter of a sample is judged against.
    pub fn expression_for(&self, sample_id: &str, param_id: &str) -> LabQcResult<String> {
        let sample = self.get_sample(sample_id)?;

        self.catalog
            .parameter(&sample.product, sample.spec_lookup_key(), param_id)
            .map(|spec| spec.expression.clone())
            .or_else(|| sample.test_results.get(param_id).map(|r| r.spec_expression.clone()))
            .ok_or_else(|| {
                LabQcError::validation(param_id, format!("not a parameter of sample {}", sample_id))
            })
    }
}

fn check_fields(analysis_type: &AnalysisType, fields: &BTreeMap<String, String>) -> LabQcResult<()> {
    let allowed = field_ids(analysis_type);

    for (id, value) in fields {
        let field = descriptor(id)
            .filter(|d| allowed.contains(&d.id))
            .ok_or_else(|| {
                LabQcError::validation(id, format!("not a field of {} samples", analysis_type))
            })?;

        field
            .check(value)
            .map_err(|message| LabQcError::validation(id, message))?;
    }

    Ok(())
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn refused(sample_id: &str, operation: &str, error: LabQcError) -> LabQcError {
    if matches!(error, LabQcError::InvalidTransition { .. } | LabQcError::Validation { .. }) {
        warn!(sample_id, operation, error = %error, "Sample operation refused");
    }
    error
}
