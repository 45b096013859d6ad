//! Sample State Machine
//!
//! Defines the approval lifecycle of a sample:
//! `Draft -> PendingApproval -> {Approved, Rejected}`.

use serde::{Deserialize, Serialize};

use labqc_models::{AuditAction, SampleResult, SampleStatus};

/// Transition rules for [`SampleStatus`].
pub trait SampleLifecycle {
    /// Check if transition is valid
    fn can_transition_to(&self, target: SampleStatus) -> bool;

    /// Approved and Rejected have no outgoing transitions
    fn is_terminal(&self) -> bool;
}

impl SampleLifecycle for SampleStatus {
    fn can_transition_to(&self, target: SampleStatus) -> bool {
        use SampleStatus::*;

        match (self, target) {
            (Draft, PendingApproval) => true,

            (PendingApproval, Approved) => true,
            (PendingApproval, Rejected) => true,

            // Terminal states cannot transition
            (Approved, _) => false,
            (Rejected, _) => false,

            _ => false,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SampleStatus::Approved | SampleStatus::Rejected)
    }
}

/// A reviewer's decision on a submitted sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> SampleStatus {
        match self {
            Self::Approve => SampleStatus::Approved,
            Self::Reject => SampleStatus::Rejected,
        }
    }

    pub fn result(&self) -> SampleResult {
        match self {
            Self::Approve => SampleResult::Approved,
            Self::Reject => SampleResult::OutOfSpec,
        }
    }

    pub fn audit_action(&self) -> AuditAction {
        match self {
            Self::Approve => AuditAction::SampleApproved,
            Self::Reject => AuditAction::SampleRejected,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "approved" => Some(Self::Approve),
            "reject" | "rejected" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}
