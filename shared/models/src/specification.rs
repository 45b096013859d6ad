//! Product specification catalog for the LabQC system.
//!
//! Specifications are configuration: an administrator defines, per product and
//! analysis type, the parameters that must be measured and the expression each
//! measured value is judged against. The engine only ever reads them.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single measurable parameter and its acceptance expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    #[validate(length(min = 1, max = 100, message = "Parameter id is required"))]
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "Parameter label is required"))]
    pub label: String,
    #[validate(length(min = 1, max = 100, message = "Specification expression is required"))]
    #[serde(alias = "spec")]
    pub expression: String,
    #[serde(default)]
    pub unit: String,
}

/// All parameters required for one product under one analysis type
/// (or product category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductSpecification {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub product_name: String,
    #[validate(length(min = 1, max = 100, message = "Analysis type is required"))]
    pub analysis_type: String,
    #[serde(default)]
    pub parameters: Vec<Specification>,
}

/// Catalog keyed by `(product name, analysis type)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationCatalog {
    #[serde(default)]
    pub products: Vec<ProductSpecification>,
}

impl Specification {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        expression: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            expression: expression.into(),
            unit: unit.into(),
        }
    }
}

impl SpecificationCatalog {
    pub fn new(products: Vec<ProductSpecification>) -> Self {
        Self { products }
    }

    /// Parses a catalog from YAML.
    ///
    /// The document is either a mapping with a `products` list or the bare
    /// list itself.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        match serde_yaml::from_str::<Self>(yaml) {
            Ok(catalog) => Ok(catalog),
            Err(mapping_err) => serde_yaml::from_str::<Vec<ProductSpecification>>(yaml)
                .map(Self::new)
                .map_err(|_| mapping_err),
        }
    }

    /// Returns the parameters for a product, or an empty slice when the
    /// product has no specification under that key.
    pub fn find(&self, product_name: &str, analysis_key: &str) -> &[Specification] {
        self.products
            .iter()
            .find(|p| p.product_name == product_name && p.analysis_type == analysis_key)
            .map(|p| p.parameters.as_slice())
            .unwrap_or(&[])
    }

    pub fn parameter(
        &self,
        product_name: &str,
        analysis_key: &str,
        param_id: &str,
    ) -> Option<&Specification> {
        self.find(product_name, analysis_key)
            .iter()
            .find(|s| s.id == param_id)
    }

    pub fn product_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.products.iter().map(|p| p.product_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Catalog shipped with the system for the products the lab handles today.
    pub fn builtin() -> Self {
        let oil_export = || {
            vec![
                Specification::new("ffa", "Free Fatty Acids", "<2", "%"),
                Specification::new("peroxideValue", "Peroxide Value", "<3", "meq O₂/kg"),
            ]
        };

        Self::new(vec![
            ProductSpecification {
                product_name: "Organic Shea Nuts".to_string(),
                analysis_type: "Raw Material".to_string(),
                parameters: vec![
                    Specification::new("moistureContent", "Moisture Content", "<10", "%"),
                    Specification::new("oilContent", "Oil Content", "40-50", "%"),
                    Specification::new("ffa", "Free Fatty Acids", "<3", "%"),
                    Specification::new("aflatoxin", "Aflatoxin", "<10", "ppb"),
                ],
            },
            ProductSpecification {
                product_name: "Cold-Pressed Macadamia Oil".to_string(),
                analysis_type: "Finished Product".to_string(),
                parameters: vec![
                    Specification::new("ffa", "Free Fatty Acids", "<2", "%"),
                    Specification::new("peroxideValue", "Peroxide Value", "<5", "meq O₂/kg"),
                    Specification::new("iodineValue", "Iodine Value", "70-80", ""),
                    Specification::new("saponificationValue", "Saponification Value", "190-200", ""),
                ],
            },
            ProductSpecification {
                product_name: "Export Grade Baobab Oil".to_string(),
                analysis_type: "Finished Product".to_string(),
                parameters: oil_export(),
            },
            ProductSpecification {
                product_name: "Export Grade Baobab Oil".to_string(),
                analysis_type: "Export".to_string(),
                parameters: oil_export(),
            },
            ProductSpecification {
                product_name: "Lavender Essential Oil".to_string(),
                analysis_type: "Essential Oil".to_string(),
                parameters: vec![
                    Specification::new("specificGravity", "Specific Gravity", "0.880-0.892", ""),
                    Specification::new("opticalRotation", "Optical Rotation", "-10 to -5", "°"),
                    Specification::new("refractiveIndex", "Refractive Index", "1.458-1.462", ""),
                    Specification::new("linaloolContent", "Linalool Content", "25-38", "%"),
                ],
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = SpecificationCatalog::builtin();
        let specs = catalog.find("Organic Shea Nuts", "Raw Material");
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[1].expression, "40-50");

        assert!(catalog.find("Organic Shea Nuts", "Export").is_empty());
        assert!(catalog.find("Unknown", "Raw Material").is_empty());
    }

    #[test]
    fn test_parameter_lookup() {
        let catalog = SpecificationCatalog::builtin();
        let ffa = catalog
            .parameter("Export Grade Baobab Oil", "Export", "ffa")
            .unwrap();
        assert_eq!(ffa.expression, "<2");
        assert!(catalog.parameter("Export Grade Baobab Oil", "Export", "color").is_none());
    }

    #[test]
    fn test_from_yaml_accepts_spec_alias_and_bare_list() {
        let yaml = r#"
products:
  - productName: Shea Butter
    analysisType: Finished Product
    parameters:
      - id: moisture
        label: Moisture
        spec: "<0.5"
        unit: "%"
"#;
        let catalog = SpecificationCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.find("Shea Butter", "Finished Product")[0].expression, "<0.5");

        let bare = r#"
- productName: Shea Butter
  analysisType: Export
  parameters:
    - id: color
      label: Color
      expression: Ivory
"#;
        let catalog = SpecificationCatalog::from_yaml_str(bare).unwrap();
        let color = &catalog.find("Shea Butter", "Export")[0];
        assert_eq!(color.expression, "Ivory");
        assert_eq!(color.unit, "");
    }

    #[test]
    fn test_specification_validation() {
        let empty = Specification::new("", "Moisture", "<10", "%");
        assert!(empty.validate().is_err());
        assert!(Specification::new("moisture", "Moisture", "<10", "%").validate().is_ok());
    }

    #[test]
    fn test_product_names_are_unique() {
        let catalog = SpecificationCatalog::builtin();
        let names = catalog.product_names();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"Export Grade Baobab Oil"));
    }
}
