//! Entry field descriptors per analysis type.
//!
//! Which descriptive fields an analyst fills in depends on the analysis type.
//! The mapping is plain data: adding an analysis type or a field is a table
//! change.

use chrono::NaiveDate;
use serde::Serialize;

use crate::sample::AnalysisType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    Text,
    Number,
    Date,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    pub options: &'static [&'static str],
}

const fn field(id: &'static str, label: &'static str, kind: InputKind) -> FieldDescriptor {
    FieldDescriptor { id, label, kind, options: &[] }
}

const fn select(
    id: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FieldDescriptor {
    FieldDescriptor { id, label, kind: InputKind::Select, options }
}

pub static FIELD_DESCRIPTORS: &[FieldDescriptor] = &[
    field("product", "Product Name", InputKind::Text),
    field("lot", "Lot Number", InputKind::Text),
    field("supplier", "Supplier", InputKind::Text),
    field("supplierLotNumber", "Supplier Lot Number", InputKind::Text),
    field("client", "Client", InputKind::Text),
    field("exportNumber", "Export Number", InputKind::Text),
    field("destination", "Destination", InputKind::Text),
    field("countryOfOrigin", "Country of Origin", InputKind::Text),
    field("dateReceived", "Received/Sampling Date", InputKind::Date),
    field("analysisDate", "Analysis Date", InputKind::Date),
    select("shift", "Shift", &["Day", "Night"]),
    select("interval", "Interval", &["1st 4 hours", "2nd 4 hours", "3rd 4 hours"]),
    select(
        "analysisRequested",
        "Analysis Type Requested",
        &["Full Analysis", "Basic Analysis", "Custom Analysis"],
    ),
    field("recoverySKR", "% Recovery (SKR)", InputKind::Number),
    field("viableRecovery", "% Viable Recovery", InputKind::Number),
    select(
        "color",
        "Color",
        &["Clear", "Light Yellow", "Golden Yellow", "Amber", "Dark Brown", "Green", "Other"],
    ),
    select(
        "odor",
        "Odor",
        &["Normal", "Mild", "Strong", "Rancid", "Fresh", "Fruity", "Nutty", "Off-odor"],
    ),
    select("sediments", "Sediments in Sample", &["None", "Trace", "Light", "Moderate", "Heavy"]),
    select(
        "foreignMatter",
        "Foreign Matter/Sediments",
        &["None", "Trace", "Present", "Significant"],
    ),
    field("comments", "Comments", InputKind::Text),
];

pub const BASE_FIELDS: &[&str] = &["product", "lot", "dateReceived", "analysisDate", "shift", "comments"];

/// Type-specific fields, appended to [`BASE_FIELDS`].
static TYPE_FIELDS: &[(&str, &[&str])] = &[
    ("Raw Material", &["supplier", "recoverySKR", "viableRecovery", "color", "odor", "destination"]),
    ("In-Process", &["interval", "odor", "sediments", "destination"]),
    (
        "Incoming Pre-Shipment",
        &["supplier", "recoverySKR", "viableRecovery", "color", "odor", "destination"],
    ),
    (
        "Outgoing Pre-Shipment",
        &["client", "recoverySKR", "viableRecovery", "color", "odor", "destination"],
    ),
    ("Finished Product", &["destination", "odor", "sediments", "client", "exportNumber"]),
    ("By-Product", &["odor", "color", "destination"]),
    ("Export", &["client", "exportNumber", "destination", "odor"]),
    (
        "Essential Oil",
        &[
            "countryOfOrigin",
            "supplier",
            "supplierLotNumber",
            "analysisRequested",
            "odor",
            "foreignMatter",
            "client",
            "exportNumber",
        ],
    ),
];

pub fn descriptor(id: &str) -> Option<&'static FieldDescriptor> {
    FIELD_DESCRIPTORS.iter().find(|d| d.id == id)
}

/// Field ids an analyst fills in for the given analysis type.
pub fn field_ids(analysis_type: &AnalysisType) -> Vec<&'static str> {
    let extra = TYPE_FIELDS
        .iter()
        .find(|(label, _)| *label == analysis_type.label())
        .map(|(_, ids)| *ids)
        .unwrap_or(&[]);

    BASE_FIELDS.iter().chain(extra.iter()).copied().collect()
}

pub fn fields_for(analysis_type: &AnalysisType) -> Vec<&'static FieldDescriptor> {
    field_ids(analysis_type)
        .into_iter()
        .filter_map(descriptor)
        .collect()
}

impl FieldDescriptor {
    /// Checks an entered value against the field's input kind.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }

        match self.kind {
            InputKind::Text => Ok(()),
            InputKind::Number => match value.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(()),
                _ => Err(format!("'{}' is not a number", value)),
            },
            InputKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", value)),
            InputKind::Select => {
                if self.options.iter().any(|o| *o == value) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of: {}", value, self.options.join(", ")))
                }
            }
        }
    }
}
