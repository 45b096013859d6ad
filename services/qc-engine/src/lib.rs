//! LabQC Engine
//!
//! Wires the specification catalog, sample workflow, inventory ledger and
//! audit trail together for an embedding host, and derives the dashboard
//! read models from their snapshots.

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use labqc_database::{initialize_repositories, ChainVerification, Repositories};
use labqc_inventory_ledger::{AddStockRequest, InventoryLedger, LogConsumptionRequest};
use labqc_models::{
    fields_for, AnalysisType, AuditEntry, FieldDescriptor, InventoryItem, ResultStatus, Sample,
    SampleResult, SampleStatus, Specification, SpecificationCatalog, StockStatus,
};
use labqc_sample_workflow::{
    CreateDraftRequest, Decision, FieldValidationCoordinator, SampleWorkflowService,
    ValidationTicket,
};
use labqc_utils::spec::{self, ValidationOutcome};
use labqc_utils::{init_logging, AppConfig, LabQcResult};

/// Per analysis type sample counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTypeSummary {
    pub completed: usize,
    pub pending: usize,
    pub approved: usize,
    pub out_of_spec: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_samples: usize,
    pub samples_by_status: BTreeMap<String, usize>,
    pub by_analysis_type: BTreeMap<String, AnalysisTypeSummary>,
    pub critical_items: Vec<String>,
    pub low_items: Vec<String>,
}

pub struct QcEngine {
    config: AppConfig,
    repositories: Repositories,
    workflow: Arc<SampleWorkflowService>,
    ledger: InventoryLedger,
    field_validation: FieldValidationCoordinator,
}

impl QcEngine {
    /// Loads configuration from the environment, installs logging and
    /// builds the engine.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = AppConfig::load().context("Failed to load configuration")?;
        init_logging(&config.logging)?;
        Ok(Self::from_config(config)?)
    }

    pub fn from_config(config: AppConfig) -> LabQcResult<Self> {
        config.validate()?;
        let catalog = config.catalog.load_catalog()?;
        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: AppConfig, catalog: SpecificationCatalog) -> Self {
        let repositories = initialize_repositories();
        let catalog = Arc::new(catalog);

        let workflow = Arc::new(SampleWorkflowService::new(
            Arc::clone(&catalog),
            Arc::clone(&repositories.samples),
            Arc::clone(&repositories.audit),
            config.workflow.clone(),
        ));
        let ledger = InventoryLedger::new(
            Arc::clone(&repositories.inventory),
            Arc::clone(&repositories.audit),
            config.inventory.thresholds(),
        );

        info!(
            products = catalog.products.len(),
            critical_pct = config.inventory.critical_threshold_pct,
            low_pct = config.inventory.low_threshold_pct,
            "LabQC engine initialized"
        );

        Self {
            config,
            repositories,
            workflow,
            ledger,
            field_validation: FieldValidationCoordinator::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn workflow(&self) -> &SampleWorkflowService {
        &self.workflow
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    // ===== Specifications =====

    pub fn validate(&self, raw_value: &str, expression: &str) -> ValidationOutcome {
        spec::validate(raw_value, expression)
    }

    pub fn specifications_for(&self, product: &str, analysis_key: &str) -> Vec<Specification> {
        self.workflow.catalog().find(product, analysis_key).to_vec()
    }

    pub fn field_descriptors(&self, analysis_type: &AnalysisType) -> Vec<&'static FieldDescriptor> {
        fields_for(analysis_type)
    }

    // ===== Samples =====

    pub fn create_draft(&self, request: CreateDraftRequest) -> LabQcResult<Sample> {
        self.workflow.create_draft(request)
    }

    pub fn record_result(&self, sample_id: &str, param_id: &str, value: &str) -> LabQcResult<Sample> {
        self.workflow.record_result(sample_id, param_id, value)
    }

    /// Routes a value typed by the analyst through the field validation
    /// coordinator; only the latest value per parameter is recorded.
    pub async fn enter_result(
        &self,
        sample_id: &str,
        param_id: &str,
        raw_value: &str,
    ) -> LabQcResult<ValidationTicket> {
        self.field_validation
            .submit_result(Arc::clone(&self.workflow), sample_id, param_id, raw_value)
            .await
    }

    pub fn submit(&self, sample_id: &str) -> LabQcResult<Sample> {
        self.workflow.submit(sample_id)
    }

    /// Submits once pending field validations are cancelled. A submitted
    /// sample no longer accepts results, so its validation state is dropped.
    pub async fn submit_after_entry(&self, sample_id: &str) -> LabQcResult<Sample> {
        self.field_validation.cancel_all(sample_id).await;
        let sample = self.workflow.submit(sample_id)?;
        self.field_validation.forget(sample_id).await;
        Ok(sample)
    }

    pub fn field_validation(&self) -> &FieldValidationCoordinator {
        &self.field_validation
    }

    pub fn decide(&self, sample_id: &str, decision: Decision, reason: Option<&str>) -> LabQcResult<Sample> {
        self.workflow.decide(sample_id, decision, reason)
    }

    pub fn get_sample(&self, sample_id: &str) -> LabQcResult<Sample> {
        self.workflow.get_sample(sample_id)
    }

    pub fn list_samples(&self) -> LabQcResult<Vec<Sample>> {
        self.workflow.list_samples()
    }

    pub fn approval_queue(&self) -> LabQcResult<Vec<Sample>> {
        self.workflow.approval_queue()
    }

    // ===== Inventory =====

    pub fn add_stock(&self, request: AddStockRequest) -> LabQcResult<InventoryItem> {
        self.ledger.add_stock(request)
    }

    pub fn log_consumption(&self, request: LogConsumptionRequest) -> LabQcResult<InventoryItem> {
        self.ledger.log_consumption(request)
    }

    /// Logs reagent usage against a sample, referencing it as
    /// `"{product} ({sample id})"`.
    pub fn log_consumption_for_sample(
        &self,
        sample_id: &str,
        item_name: &str,
        amount: f64,
        date: NaiveDate,
    ) -> LabQcResult<InventoryItem> {
        let sample = self.workflow.get_sample(sample_id)?;

        self.ledger.log_consumption(LogConsumptionRequest {
            name: item_name.to_string(),
            amount,
            date,
            product_ref: sample.reference(),
        })
    }

    pub fn get_item(&self, name: &str) -> LabQcResult<InventoryItem> {
        self.ledger.get_item(name)
    }

    pub fn list_items(&self) -> LabQcResult<Vec<InventoryItem>> {
        self.ledger.list_items()
    }

    pub fn critical_items(&self) -> LabQcResult<Vec<InventoryItem>> {
        self.ledger.critical_items()
    }

    pub fn consumption_totals(&self) -> LabQcResult<BTreeMap<String, f64>> {
        self.ledger.consumption_totals()
    }

    pub fn export_consumption_csv(&self) -> LabQcResult<String> {
        self.ledger.export_consumption_csv()
    }

    // ===== Audit =====

    pub fn audit_trail(&self) -> LabQcResult<Vec<AuditEntry>> {
        self.repositories.audit.list()
    }

    pub fn audit_for(&self, entity_type: &str, entity_id: &str) -> LabQcResult<Vec<AuditEntry>> {
        self.repositories.audit.find_by_entity(entity_type, entity_id)
    }

    pub fn verify_audit_chain(&self) -> LabQcResult<ChainVerification> {
        self.repositories.audit.verify_chain()
    }

    pub fn export_audit_csv(&self) -> LabQcResult<String> {
        self.repositories.audit.export_csv()
    }

    // ===== Dashboard =====

    pub fn dashboard_summary(&self) -> LabQcResult<DashboardSummary> {
        let samples = self.workflow.list_samples()?;
        let items = self.ledger.list_items()?;

        Ok(summarize(&samples, &items))
    }
}

fn summarize(samples: &[Sample], items: &[InventoryItem]) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_samples: samples.len(),
        ..DashboardSummary::default()
    };

    for status in [
        SampleStatus::Draft,
        SampleStatus::PendingApproval,
        SampleStatus::Approved,
        SampleStatus::Rejected,
    ] {
        summary.samples_by_status.insert(status.to_string(), 0);
    }

    for sample in samples {
        *summary
            .samples_by_status
            .entry(sample.status.to_string())
            .or_default() += 1;

        let counts = summary
            .by_analysis_type
            .entry(sample.analysis_type.label().to_string())
            .or_default();

        if sample.is_decided() {
            counts.completed += 1;
        } else {
            counts.pending += 1;
        }
        if sample.status == SampleStatus::Approved {
            counts.approved += 1;
        }
        if sample.result == SampleResult::OutOfSpec
            || (!sample.is_decided() && sample.verdict == ResultStatus::Fail)
        {
            counts.out_of_spec += 1;
        }
    }

    for item in items {
        match item.status {
            StockStatus::Critical => summary.critical_items.push(item.name.clone()),
            StockStatus::Low => summary.low_items.push(item.name.clone()),
            StockStatus::Ok => {}
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_summarize_counts() {
        let now = Utc::now();
        let mut approved = Sample::new("RM-0001", "Organic Shea Nuts", "L-1", AnalysisType::RawMaterial, now);
        approved.status = SampleStatus::Approved;
        approved.result = SampleResult::Approved;

        let mut failing = Sample::new("RM-0002", "Organic Shea Nuts", "L-2", AnalysisType::RawMaterial, now);
        failing.verdict = ResultStatus::Fail;

        let draft = Sample::new("EO-0003", "Lavender Essential Oil", "L-3", AnalysisType::EssentialOil, now);

        let mut hexane = InventoryItem::new("Hexane", "L");
        hexane.status = StockStatus::Critical;

        let summary = summarize(&[approved, failing, draft], &[hexane]);

        assert_eq!(summary.total_samples, 3);
        assert_eq!(summary.samples_by_status["draft"], 2);
        assert_eq!(summary.samples_by_status["approved"], 1);
        assert_eq!(summary.samples_by_status["rejected"], 0);

        let raw = &summary.by_analysis_type["Raw Material"];
        assert_eq!(
            *raw,
            AnalysisTypeSummary {
                completed: 1,
                pending: 1,
                approved: 1,
                out_of_spec: 1,
            }
        );
        assert_eq!(summary.by_analysis_type["Essential Oil"].pending, 1);
        assert_eq!(summary.critical_items, vec!["Hexane".to_string()]);
        assert!(summary.low_items.is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid_thresholds() {
        let mut config = AppConfig::default();
        config.inventory.low_threshold_pct = 5.0;
        assert!(QcEngine::from_config(config).is_err());
    }
}
