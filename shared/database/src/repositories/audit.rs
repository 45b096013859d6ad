//! Audit Repository
//!
//! Immutable audit trail with hash chain verification.

use chrono::{DateTime, Utc};
use std::sync::RwLock;
use uuid::Uuid;

use labqc_models::{AuditAction, AuditEntry};
use labqc_utils::{LabQcError, LabQcResult};

#[derive(Default)]
pub struct AuditRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry (immutable - no update/delete), chained after the
    /// current head.
    pub fn append(&self, mut entry: AuditEntry) -> LabQcResult<AuditEntry> {
        let mut entries = self.entries.write()?;
        let previous_hash = entries.last().map(|last| last.hash.clone());

        entry.seal(previous_hash);
        entries.push(entry.clone());

        tracing::debug!(
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            "Audit entry appended"
        );

        Ok(entry)
    }

    pub fn record(
        &self,
        action: AuditAction,
        entity_type: &str,
        entity_id: &str,
        actor: Option<String>,
        details: impl Into<String>,
    ) -> LabQcResult<AuditEntry> {
        self.append(AuditEntry::new(action, entity_type, entity_id, actor, details))
    }

    pub fn list(&self) -> LabQcResult<Vec<AuditEntry>> {
        Ok(self.entries.read()?.clone())
    }

    pub fn len(&self) -> LabQcResult<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> LabQcResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Find audit entries for an entity, oldest first
    pub fn find_by_entity(&self, entity_type: &str, entity_id: &str) -> LabQcResult<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()?
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    pub fn find_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LabQcResult<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()?
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .cloned()
            .collect())
    }

    /// Verify hash chain integrity over the whole trail
    pub fn verify_chain(&self) -> LabQcResult<ChainVerification> {
        let entries = self.entries.read()?;

        let mut broken_links = Vec::new();
        let mut previous_hash: Option<String> = None;

        for entry in entries.iter() {
            let expected_hash = entry.calculate_hash(previous_hash.as_deref());

            if entry.hash != expected_hash || entry.previous_hash != previous_hash {
                broken_links.push(entry.id);
            }

            previous_hash = Some(entry.hash.clone());
        }

        if !broken_links.is_empty() {
            tracing::warn!(broken = broken_links.len(), "Audit chain verification failed");
        }

        Ok(ChainVerification {
            is_valid: broken_links.is_empty(),
            entries_verified: entries.len(),
            broken_links,
        })
    }

    /// Render the trail as CSV, one row per entry in append order.
    pub fn export_csv(&self) -> LabQcResult<String> {
        let entries = self.entries.read()?;
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record([
            "id",
            "timestamp",
            "action",
            "entity_type",
            "entity_id",
            "actor",
            "details",
            "hash",
            "previous_hash",
        ])?;

        for entry in entries.iter() {
            writer.write_record([
                entry.id.to_string(),
                entry.timestamp.to_rfc3339(),
                entry.action.to_string(),
                entry.entity_type.clone(),
                entry.entity_id.clone(),
                entry.actor.clone().unwrap_or_default(),
                entry.details.clone(),
                entry.hash.clone(),
                entry.previous_hash.clone().unwrap_or_default(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| LabQcError::internal(format!("CSV export failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| LabQcError::internal(format!("CSV export failed: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainVerification {
    pub is_valid: bool,
    pub entries_verified: usize,
    pub broken_links: Vec<Uuid>,
}
