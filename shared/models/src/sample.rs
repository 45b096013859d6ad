//! Sample and test result domain models.
//!
//! A [`Sample`] is created as a draft by an analyst, filled in parameter by
//! parameter, submitted for approval and finally approved or rejected by a
//! reviewer. Its overall verdict is always derived from its test results
//! until the decision freezes it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::specification::Specification;

pub const OVERALL_AWAITING: &str = "Awaiting analysis and QC approval";
pub const OVERALL_WITHIN_SPEC: &str = "All parameters within specification";
pub const OVERALL_OUT_OF_SPEC: &str = "Out of Spec";

/// Kind of analysis a sample is taken for.
///
/// Unrecognized names are kept verbatim in [`AnalysisType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnalysisType {
    RawMaterial,
    InProcess,
    IncomingPreShipment,
    OutgoingPreShipment,
    FinishedProduct,
    ByProduct,
    Export,
    EssentialOil,
    Other(String),
}

impl AnalysisType {
    pub const KNOWN: [AnalysisType; 8] = [
        AnalysisType::RawMaterial,
        AnalysisType::InProcess,
        AnalysisType::IncomingPreShipment,
        AnalysisType::OutgoingPreShipment,
        AnalysisType::FinishedProduct,
        AnalysisType::ByProduct,
        AnalysisType::Export,
        AnalysisType::EssentialOil,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::RawMaterial => "Raw Material",
            Self::InProcess => "In-Process",
            Self::IncomingPreShipment => "Incoming Pre-Shipment",
            Self::OutgoingPreShipment => "Outgoing Pre-Shipment",
            Self::FinishedProduct => "Finished Product",
            Self::ByProduct => "By-Product",
            Self::Export => "Export",
            Self::EssentialOil => "Essential Oil",
            Self::Other(name) => name,
        }
    }

    /// Sample id prefix; `None` for unrecognized types.
    pub fn id_prefix(&self) -> Option<&'static str> {
        match self {
            Self::RawMaterial => Some("RM"),
            Self::InProcess => Some("IP"),
            Self::IncomingPreShipment => Some("IPS"),
            Self::OutgoingPreShipment => Some("OPS"),
            Self::FinishedProduct => Some("FP"),
            Self::ByProduct => Some("BP"),
            Self::Export => Some("EX"),
            Self::EssentialOil => Some("EO"),
            Self::Other(_) => None,
        }
    }

    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Self::Other(trimmed.to_string()))
    }
}

impl From<String> for AnalysisType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<AnalysisType> for String {
    fn from(analysis_type: AnalysisType) -> Self {
        analysis_type.label().to_string()
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Product category; when set it replaces the analysis type as the
/// specification lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Raw Material")]
    RawMaterial,
    #[serde(rename = "Finished Product")]
    FinishedProduct,
    #[serde(rename = "Essential Oil")]
    EssentialOil,
}

impl ProductCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RawMaterial => "Raw Material",
            Self::FinishedProduct => "Finished Product",
            Self::EssentialOil => "Essential Oil",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleStatus {
    Draft,
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Approved,
    Rejected,
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::PendingApproval => write!(f, "pending_approval"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Reviewer-facing outcome shown in sample lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleResult {
    #[serde(rename = "Pending Review")]
    PendingReview,
    Approved,
    #[serde(rename = "Out of Spec")]
    OutOfSpec,
}

/// Status of one test result, also used as a sample's aggregate verdict.
///
/// Ordered by severity so that the worst status is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    Pass,
    Pending,
    Fail,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "Pass"),
            Self::Pending => write!(f, "Pending"),
            Self::Fail => write!(f, "Fail"),
        }
    }
}

/// A measured value: numeric when it could be read as a number, the raw
/// entry otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

impl ResultValue {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl Default for ResultValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub value: ResultValue,
    pub unit: String,
    #[serde(alias = "spec")]
    pub spec_expression: String,
    pub status: ResultStatus,
}

impl TestResult {
    /// An unmeasured result for a catalog parameter.
    pub fn pending(spec: &Specification) -> Self {
        Self {
            value: ResultValue::empty(),
            unit: spec.unit.clone(),
            spec_expression: spec.expression.clone(),
            status: ResultStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: String,
    pub product: String,
    pub lot: String,
    pub analysis_type: AnalysisType,
    pub category: Option<ProductCategory>,
    pub analyst: Option<String>,
    pub priority: Priority,
    /// Descriptive entry fields keyed by field descriptor id.
    pub fields: BTreeMap<String, String>,
    pub test_results: BTreeMap<String, TestResult>,
    pub status: SampleStatus,
    pub result: SampleResult,
    pub verdict: ResultStatus,
    pub overall_result: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Sample {
    pub fn new(
        id: impl Into<String>,
        product: impl Into<String>,
        lot: impl Into<String>,
        analysis_type: AnalysisType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            product: product.into(),
            lot: lot.into(),
            analysis_type,
            category: None,
            analyst: None,
            priority: Priority::Normal,
            fields: BTreeMap::new(),
            test_results: BTreeMap::new(),
            status: SampleStatus::Draft,
            result: SampleResult::PendingReview,
            verdict: ResultStatus::Pending,
            overall_result: OVERALL_AWAITING.to_string(),
            rejection_reason: None,
            created_at,
            submitted_at: None,
            decided_at: None,
        }
    }

    /// Key used to look up this sample's specifications in the catalog.
    pub fn spec_lookup_key(&self) -> &str {
        match &self.category {
            Some(category) => category.label(),
            None => self.analysis_type.label(),
        }
    }

    /// Worst status among the test results; an empty set counts as pending.
    pub fn worst_status(&self) -> ResultStatus {
        self.test_results
            .values()
            .map(|r| r.status)
            .max()
            .unwrap_or(ResultStatus::Pending)
    }

    pub fn failing_parameters(&self) -> Vec<&str> {
        self.test_results
            .iter()
            .filter(|(_, r)| r.status == ResultStatus::Fail)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn pending_parameters(&self) -> Vec<&str> {
        self.test_results
            .iter()
            .filter(|(_, r)| r.status == ResultStatus::Pending)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn is_decided(&self) -> bool {
        matches!(self.status, SampleStatus::Approved | SampleStatus::Rejected)
    }

    /// Recomputes the verdict and overall message from the test results.
    /// Has no effect once the sample has been decided.
    pub fn refresh_verdict(&mut self) {
        if self.is_decided() {
            return;
        }

        self.verdict = self.worst_status();
        self.overall_result = match self.verdict {
            ResultStatus::Fail => format!(
                "{} - {} outside specification",
                OVERALL_OUT_OF_SPEC,
                self.failing_parameters().join(", ")
            ),
            ResultStatus::Pending => OVERALL_AWAITING.to_string(),
            ResultStatus::Pass => OVERALL_WITHIN_SPEC.to_string(),
        };
    }

    /// Traceability reference used in consumption log entries.
    pub fn reference(&self) -> String {
        format!("{} ({})", self.product, self.id)
    }
}
