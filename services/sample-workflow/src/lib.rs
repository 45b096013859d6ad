//! LabQC Sample Workflow
//!
//! Owns sample records from draft to decision: descriptive field entry,
//! per-parameter result validation against the specification catalog, the
//! aggregate verdict, and the approval state machine. Result entry can be
//! routed through [`FieldValidationCoordinator`] so that only the latest
//! value typed for a parameter is ever applied.

pub mod state_machine;
pub mod service;
pub mod field_validation;

pub use state_machine::{Decision, SampleLifecycle};
pub use service::{CreateDraftRequest, SampleWorkflowService, UNKNOWN_PRODUCT};
pub use field_validation::{FieldValidation, FieldValidationCoordinator, ValidationTicket};
