//! Supplier file loading and validation.
//!
//! The supplier file (`suppliers.yaml`) is the single configuration surface
//! for the pipeline: the supplier list, the pricing rules, and the automation
//! intervals. It is loaded once at startup; the only runtime mutation is the
//! enable/disable admin action exposed by the registry.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pricing::PricingConfig;
use crate::ConfigError;

/// Per-supplier configuration. Never created or destroyed at runtime.
#[derive(Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    /// Unique key, e.g. `"partspro"`.
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub enabled: bool,
    /// Optional API credential, resolved from an environment-style secret in
    /// deployment. Redacted from all Debug/log output.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Field name → selector path into the supplier feed items. The fetch
    /// technique behind these selectors is pluggable; the paths here are
    /// dot-separated JSON paths (e.g. `"price.amount"`).
    #[serde(default)]
    pub scrape_selectors: BTreeMap<String, String>,
    /// Requests per minute allowed against this supplier.
    pub rate_limit: u32,
    pub max_retries: u32,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for SupplierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplierConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("scrape_selectors", &self.scrape_selectors)
            .field("rate_limit", &self.rate_limit)
            .field("max_retries", &self.max_retries)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Scheduling intervals for the automation loops, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
    #[serde(default = "default_price_update_interval_ms")]
    pub price_update_interval_ms: u64,
    #[serde(default = "default_inventory_check_interval_ms")]
    pub inventory_check_interval_ms: u64,
}

const fn default_sync_interval_ms() -> u64 {
    21_600_000 // 6h
}

const fn default_price_update_interval_ms() -> u64 {
    3_600_000 // 1h
}

const fn default_inventory_check_interval_ms() -> u64 {
    1_800_000 // 30m
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: default_sync_interval_ms(),
            price_update_interval_ms: default_price_update_interval_ms(),
            inventory_check_interval_ms: default_inventory_check_interval_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SupplierFile {
    pub suppliers: Vec<SupplierConfig>,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Load and validate the supplier configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_supplier_file(path: &Path) -> Result<SupplierFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SupplierFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: SupplierFile = serde_yaml::from_str(&content)?;
    validate_suppliers(&file)?;
    Ok(file)
}

fn validate_suppliers(file: &SupplierFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for supplier in &file.suppliers {
        if supplier.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "supplier id must be non-empty".to_string(),
            ));
        }
        if supplier.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "supplier '{}' must have a non-empty name",
                supplier.id
            )));
        }
        if !seen_ids.insert(supplier.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate supplier id: '{}'",
                supplier.id
            )));
        }
        if supplier.rate_limit == 0 {
            return Err(ConfigError::Validation(format!(
                "supplier '{}' has rate_limit 0; must allow at least 1 request/minute",
                supplier.id
            )));
        }
        if supplier.timeout_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "supplier '{}' has timeout_ms 0; a network timeout is required",
                supplier.id
            )));
        }
    }

    if file.pricing.minimum_profit.is_sign_negative() {
        return Err(ConfigError::Validation(
            "pricing.minimum_profit must be non-negative".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VALID_YAML: &str = r#"
suppliers:
  - id: partspro
    name: PartsPro Wholesale
    base_url: "https://feed.partspro.example"
    enabled: true
    rate_limit: 30
    max_retries: 3
    timeout_ms: 15000
    scrape_selectors:
      title: "name"
      price: "pricing.wholesale"
  - id: motorline
    name: MotorLine Supply
    base_url: "https://api.motorline.example"
    enabled: false
    rate_limit: 60
    max_retries: 2
    timeout_ms: 10000
pricing:
  default_markup: "0.25"
  minimum_profit: "10.00"
  shipping_markup: "0.08"
  category_markup:
    Performance Tuning: "0.30"
    Interior: "0.20"
  category_map:
    tuning & chips: Performance Tuning
automation:
  sync_interval_ms: 3600000
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(content.as_bytes()).expect("write yaml");
        f
    }

    #[test]
    fn loads_valid_supplier_file() {
        let f = write_temp(VALID_YAML);
        let file = load_supplier_file(f.path()).expect("valid file should load");

        assert_eq!(file.suppliers.len(), 2);
        assert_eq!(file.suppliers[0].id, "partspro");
        assert!(file.suppliers[0].enabled);
        assert!(!file.suppliers[1].enabled);
        assert_eq!(
            file.suppliers[0].scrape_selectors.get("price").map(String::as_str),
            Some("pricing.wholesale")
        );
        assert_eq!(file.pricing.default_markup, "0.25".parse().unwrap());
        assert_eq!(file.automation.sync_interval_ms, 3_600_000);
        // Unspecified intervals fall back to defaults.
        assert_eq!(file.automation.price_update_interval_ms, 3_600_000);
    }

    #[test]
    fn missing_file_reports_io_error_with_path() {
        let result = load_supplier_file(Path::new("/nonexistent/suppliers.yaml"));
        assert!(
            matches!(result, Err(ConfigError::SupplierFileIo { ref path, .. }) if path.contains("suppliers.yaml")),
            "expected SupplierFileIo, got: {result:?}"
        );
    }

    #[test]
    fn duplicate_supplier_ids_are_rejected() {
        let yaml = VALID_YAML.replace("id: motorline", "id: partspro");
        let f = write_temp(&yaml);
        let result = load_supplier_file(f.path());
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("duplicate")),
            "expected duplicate-id validation error, got: {result:?}"
        );
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let yaml = VALID_YAML.replace("rate_limit: 30", "rate_limit: 0");
        let f = write_temp(&yaml);
        let result = load_supplier_file(f.path());
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("rate_limit")),
            "expected rate_limit validation error, got: {result:?}"
        );
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let yaml = VALID_YAML.replace(
            "    rate_limit: 30",
            "    api_key: \"sk-live-9f8e7d\"\n    rate_limit: 30",
        );
        let f = write_temp(&yaml);
        let file = load_supplier_file(f.path()).unwrap();

        let debug = format!("{:?}", file.suppliers[0]);
        assert!(!debug.contains("sk-live-9f8e7d"), "debug leaked the key: {debug}");
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn empty_supplier_id_is_rejected() {
        let yaml = VALID_YAML.replace("id: partspro", "id: \"  \"");
        let f = write_temp(&yaml);
        let result = load_supplier_file(f.path());
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("non-empty")),
            "expected non-empty-id validation error, got: {result:?}"
        );
    }
}
