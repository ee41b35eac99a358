pub mod app_config;
pub mod cancel;
pub mod config;
pub mod pricing;
pub mod records;
pub mod registry;
pub mod store;
pub mod suppliers;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read supplier file {path}: {source}")]
    SupplierFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse supplier file: {0}")]
    SupplierFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

pub use app_config::{AppConfig, Environment};
pub use cancel::CancelToken;
pub use config::{load_app_config, load_app_config_from_env};
pub use pricing::{PricingConfig, PricingError};
pub use records::{CatalogProduct, ProductKey, RawProductRecord};
pub use registry::{RegistryError, SupplierRegistry};
pub use store::{CatalogStore, MemoryCatalogStore, StoreError};
pub use suppliers::{load_supplier_file, AutomationConfig, SupplierConfig, SupplierFile};
