use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub actor: Option<String>,
    pub details: String,
    pub hash: String,
    pub previous_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditAction {
    SampleCreated,
    ResultRecorded,
    SampleSubmitted,
    SampleApproved,
    SampleRejected,
    StockReceived,
    ConsumptionLogged,
    StockAlert,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SampleCreated => "sample_created",
            Self::ResultRecorded => "result_recorded",
            Self::SampleSubmitted => "sample_submitted",
            Self::SampleApproved => "sample_approved",
            Self::SampleRejected => "sample_rejected",
            Self::StockReceived => "stock_received",
            Self::ConsumptionLogged => "consumption_logged",
            Self::StockAlert => "stock_alert",
        };
        f.write_str(name)
    }
}

impl AuditEntry {
    /// Creates an unchained entry; the audit repository links and hashes it
    /// on append.
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        actor: Option<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            actor,
            details: details.into(),
            hash: String::new(),
            previous_hash: None,
        }
    }

    pub fn calculate_hash(&self, previous_hash: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.id.to_string().as_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.action.to_string().as_bytes());
        hasher.update(self.entity_type.as_bytes());
        hasher.update(self.entity_id.as_bytes());
        hasher.update(self.actor.as_deref().unwrap_or_default().as_bytes());
        hasher.update(self.details.as_bytes());

        if let Some(prev) = previous_hash {
            hasher.update(prev.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Links this entry after `previous_hash` and seals it.
    pub fn seal(&mut self, previous_hash: Option<String>) {
        self.hash = self.calculate_hash(previous_hash.as_deref());
        self.previous_hash = previous_hash;
    }

    pub fn verify_integrity(&self) -> bool {
        self.calculate_hash(self.previous_hash.as_deref()) == self.hash
    }
}
