use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to supplier '{supplier_id}' timed out after {timeout_ms}ms")]
    Timeout { supplier_id: String, timeout_ms: u64 },

    #[error("rate limited by supplier '{supplier_id}' (retry after {retry_after_secs}s)")]
    RateLimited {
        supplier_id: String,
        retry_after_secs: u64,
    },

    #[error("feed endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL for supplier '{supplier_id}': {reason}")]
    InvalidBaseUrl { supplier_id: String, reason: String },

    #[error("unparseable item from supplier '{supplier_id}': {reason}")]
    ItemParse { supplier_id: String, reason: String },
}
