use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

use labqc_models::{SpecificationCatalog, StockThresholds};

use crate::error::{LabQcError, LabQcResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub workflow: WorkflowConfig,
    pub inventory: InventoryConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Id prefix for samples whose analysis type has none.
    pub fallback_prefix: String,
    /// Refuse submission while any parameter is still pending.
    pub require_complete_results: bool,
    /// Refuse rejection without a reason.
    pub require_rejection_reason: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub critical_threshold_pct: f64,
    pub low_threshold_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// YAML specification catalog; the built-in catalog is used when unset.
    pub path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Local overrides (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("LABQC").separator("__"));

        config.build()?.try_deserialize()
    }

    pub fn validate(&self) -> LabQcResult<()> {
        let inventory = &self.inventory;
        for (field, pct) in [
            ("inventory.critical_threshold_pct", inventory.critical_threshold_pct),
            ("inventory.low_threshold_pct", inventory.low_threshold_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(LabQcError::validation(field, "must be between 0 and 100"));
            }
        }

        if inventory.critical_threshold_pct >= inventory.low_threshold_pct {
            return Err(LabQcError::validation(
                "inventory.critical_threshold_pct",
                "must be below inventory.low_threshold_pct",
            ));
        }

        if self.workflow.fallback_prefix.trim().is_empty() {
            return Err(LabQcError::validation(
                "workflow.fallback_prefix",
                "must not be empty",
            ));
        }

        Ok(())
    }
}

impl InventoryConfig {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            critical_pct: self.critical_threshold_pct,
            low_pct: self.low_threshold_pct,
        }
    }
}

impl CatalogConfig {
    pub fn load_catalog(&self) -> LabQcResult<SpecificationCatalog> {
        match &self.path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|e| {
                    LabQcError::configuration(format!("cannot read catalog {}: {}", path, e))
                })?;
                Ok(SpecificationCatalog::from_yaml_str(&yaml)?)
            }
            None => Ok(SpecificationCatalog::builtin()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            fallback_prefix: "GN".to_string(),
            require_complete_results: false,
            require_rejection_reason: false,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let thresholds = StockThresholds::default();
        Self {
            critical_threshold_pct: thresholds.critical_pct,
            low_threshold_pct: thresholds.low_pct,
        }
    }
}
