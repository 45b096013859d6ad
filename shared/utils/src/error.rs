use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabQcError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Invalid transition for {entity_id}: {from} -> {to}")]
    InvalidTransition {
        entity_id: String,
        from: String,
        to: String,
    },

    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: f64,
        available: f64,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LabQcError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_transition(
        entity_id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity_id: entity_id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn insufficient_stock(item: impl Into<String>, requested: f64, available: f64) -> Self {
        Self::InsufficientStock {
            item: item.into(),
            requested,
            available,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

pub type LabQcResult<T> = Result<T, LabQcError>;

// Conversion from common error types
impl From<serde_json::Error> for LabQcError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<serde_yaml::Error> for LabQcError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<config::ConfigError> for LabQcError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<csv::Error> for LabQcError {
    fn from(error: csv::Error) -> Self {
        Self::internal(format!("CSV export failed: {}", error))
    }
}

impl From<std::io::Error> for LabQcError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for LabQcError {
    fn from(error: std::sync::PoisonError<T>) -> Self {
        Self::storage(format!("lock poisoned: {}", error))
    }
}
