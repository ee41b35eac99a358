use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Absent when running against the in-memory store only (`test` mode).
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub suppliers_path: PathBuf,
    pub image_dir: PathBuf,
    pub placeholder_image: String,
    pub user_agent: String,
    pub image_max_concurrent: usize,
    pub image_batch_pause_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Prefix used to anonymize customer identity on supplier purchase orders.
    pub order_reference_prefix: String,
    /// Retailer business identity used for the billing block on forwarded
    /// orders.
    pub business_name: String,
    pub backoff_base_ms: u64,
    /// Politeness gap between successive suppliers in a full scrape run.
    pub inter_supplier_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("suppliers_path", &self.suppliers_path)
            .field("image_dir", &self.image_dir)
            .field("placeholder_image", &self.placeholder_image)
            .field("user_agent", &self.user_agent)
            .field("image_max_concurrent", &self.image_max_concurrent)
            .field("image_batch_pause_ms", &self.image_batch_pause_ms)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("order_reference_prefix", &self.order_reference_prefix)
            .field("business_name", &self.business_name)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("inter_supplier_delay_ms", &self.inter_supplier_delay_ms)
            .finish()
    }
}
