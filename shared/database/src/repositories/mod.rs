//! Repository module for entity storage
//!
//! Provides the per-entity locked store used for samples and inventory
//! items, plus the append-only audit trail.

pub mod memory;
pub mod audit;

pub use memory::{Entity, InMemoryRepository};
pub use audit::{AuditRepository, ChainVerification};
