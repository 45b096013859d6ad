pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod spec;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.workflow.fallback_prefix, "GN");
        assert_eq!(config.inventory.critical_threshold_pct, 10.0);
        assert_eq!(config.inventory.low_threshold_pct, 25.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.inventory.critical_threshold_pct = 30.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_builtin_catalog_without_path() {
        let catalog = CatalogConfig::default().load_catalog().unwrap();
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_shipped_catalog_file_loads() {
        let config = CatalogConfig {
            path: Some(format!(
                "{}/../../config/specifications.yaml",
                env!("CARGO_MANIFEST_DIR")
            )),
        };
        let catalog = config.load_catalog().unwrap();

        let color = catalog
            .parameter("Lavender Essential Oil", "Essential Oil", "color")
            .unwrap();
        assert_eq!(color.expression, "Light Yellow");
        assert_eq!(catalog.find("Organic Shea Nuts", "Raw Material").len(), 4);
    }

    #[test]
    fn test_missing_catalog_file_is_configuration_error() {
        let config = CatalogConfig {
            path: Some("/nonexistent/specifications.yaml".to_string()),
        };
        let err = config.load_catalog().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_error_handling() {
        let error = LabQcError::validation("test_field", "test message");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(
            error.to_string(),
            "Validation error: test_field - test message"
        );

        let error = LabQcError::invalid_transition("RM-1234", "approved", "rejected");
        assert_eq!(error.error_code(), "INVALID_TRANSITION");
    }
}
