//! In-memory supplier registry.
//!
//! Holds the validated supplier list in file order. Lookups never mutate;
//! `set_enabled` is the single admin side channel for flipping a supplier on
//! or off between sync runs.

use thiserror::Error;

use crate::suppliers::SupplierConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown supplier: '{0}'")]
    UnknownSupplier(String),

    #[error("supplier '{0}' is disabled")]
    SupplierDisabled(String),
}

#[derive(Debug, Clone)]
pub struct SupplierRegistry {
    suppliers: Vec<SupplierConfig>,
}

impl SupplierRegistry {
    /// Builds a registry preserving the insertion order of the supplier file.
    /// The order is what makes multi-supplier runs reproducible.
    #[must_use]
    pub fn new(suppliers: Vec<SupplierConfig>) -> Self {
        Self { suppliers }
    }

    /// All enabled suppliers, in file order.
    #[must_use]
    pub fn active_suppliers(&self) -> Vec<&SupplierConfig> {
        self.suppliers.iter().filter(|s| s.enabled).collect()
    }

    /// All suppliers regardless of enabled flag, in file order.
    #[must_use]
    pub fn all_suppliers(&self) -> &[SupplierConfig] {
        &self.suppliers
    }

    /// Looks up a supplier and requires it to be enabled.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownSupplier`] if the id is absent,
    /// [`RegistryError::SupplierDisabled`] if present but disabled.
    pub fn validate(&self, supplier_id: &str) -> Result<&SupplierConfig, RegistryError> {
        let supplier = self
            .suppliers
            .iter()
            .find(|s| s.id == supplier_id)
            .ok_or_else(|| RegistryError::UnknownSupplier(supplier_id.to_string()))?;

        if !supplier.enabled {
            return Err(RegistryError::SupplierDisabled(supplier_id.to_string()));
        }
        Ok(supplier)
    }

    /// Admin side channel: enable or disable a supplier in place.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSupplier`] if the id is absent.
    pub fn set_enabled(&mut self, supplier_id: &str, enabled: bool) -> Result<(), RegistryError> {
        let supplier = self
            .suppliers
            .iter_mut()
            .find(|s| s.id == supplier_id)
            .ok_or_else(|| RegistryError::UnknownSupplier(supplier_id.to_string()))?;
        supplier.enabled = enabled;
        tracing::info!(supplier = %supplier_id, enabled, "supplier enabled flag changed");
        Ok(())
    }
}
