//! # LabQC Core Domain Models
//!
//! Domain models for the LabQC laboratory quality-control record keeper.
//! All models implement serialization with serde; configuration-facing models
//! carry validator rules.
//!
//! ## Key Models
//!
//! - **SpecificationCatalog**: per product and analysis type, the parameters to measure and their acceptance expressions
//! - **Sample**: a product sample with its test results, aggregate verdict and approval status
//! - **FieldDescriptor**: data-driven entry fields for each analysis type
//! - **InventoryItem**: a reagent stock item with its receipt and consumption history
//! - **AuditEntry**: a hash-chained record of a workflow or ledger mutation

pub mod specification;
pub mod sample;
pub mod fields;
pub mod inventory;
pub mod audit;

#[cfg(test)]
pub mod property_tests;

pub use specification::*;
pub use sample::*;
pub use fields::{descriptor, field_ids, fields_for, FieldDescriptor, InputKind, BASE_FIELDS};
pub use inventory::*;
pub use audit::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry_seal_and_verify() {
        let mut entry = AuditEntry::new(
            AuditAction::SampleCreated,
            "sample",
            "RM-0001",
            Some("Kevin Masinde".to_string()),
            "Raw Material sample created",
        );
        assert!(entry.hash.is_empty());

        entry.seal(None);
        assert_eq!(entry.hash.len(), 64);
        assert!(entry.verify_integrity());

        entry.details = "tampered".to_string();
        assert!(!entry.verify_integrity());
    }

    #[test]
    fn test_seal_depends_on_previous_hash() {
        let base = AuditEntry::new(AuditAction::StockAlert, "inventory", "Hexane", None, "critical");
        let mut first = base.clone();
        let mut second = base;
        first.seal(None);
        second.seal(Some("abc".to_string()));
        assert_ne!(first.hash, second.hash);
        assert!(second.verify_integrity());
    }

    #[test]
    fn test_new_sample_is_draft_awaiting_analysis() {
        let sample = Sample::new(
            "FP-1234",
            "Cold-Pressed Macadamia Oil",
            "MO-223-CP",
            AnalysisType::FinishedProduct,
            chrono::Utc::now(),
        );
        assert_eq!(sample.status, SampleStatus::Draft);
        assert_eq!(sample.result, SampleResult::PendingReview);
        assert_eq!(sample.overall_result, OVERALL_AWAITING);
        assert_eq!(sample.reference(), "Cold-Pressed Macadamia Oil (FP-1234)");
    }
}
