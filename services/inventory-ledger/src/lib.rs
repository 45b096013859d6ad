//! LabQC Inventory Ledger
//!
//! Tracks reagent stock: receipts add packages of a fixed capacity,
//! consumption is logged against the product analyzed, and each item's
//! health (OK, Low, Critical) follows from its remaining fraction. A drop
//! into Low or Critical raises a stock alert in the log and the audit trail.

pub mod service;

pub use service::{AddStockRequest, InventoryLedger, LogConsumptionRequest};
