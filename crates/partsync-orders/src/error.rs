use thiserror::Error;

use crate::model::OrderStatus;

/// Failures reported by a supplier's order API.
#[derive(Debug, Error)]
pub enum OrderApiError {
    #[error("supplier '{supplier_id}' timed out after {timeout_ms}ms")]
    Timeout { supplier_id: String, timeout_ms: u64 },

    #[error("supplier '{supplier_id}' rate limited the request")]
    RateLimited { supplier_id: String },

    #[error("supplier '{supplier_id}' unavailable: {reason}")]
    Unavailable { supplier_id: String, reason: String },

    #[error("supplier '{supplier_id}' rejected the order: {reason}")]
    Rejected { supplier_id: String, reason: String },

    #[error("supplier order '{supplier_order_id}' not found")]
    UnknownOrder { supplier_order_id: String },
}

impl OrderApiError {
    /// Rejections and unknown order ids are final; everything else is a
    /// supplier-side hiccup worth another attempt.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Unavailable { .. } => true,
            Self::Rejected { .. } | Self::UnknownOrder { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cannot resolve supplier for order {order_id}: {reason}")]
    SupplierResolution { order_id: String, reason: String },

    #[error("illegal order transition {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("order {order_id} has no supplier order id")]
    NotSubmitted { order_id: String },

    #[error(transparent)]
    Api(#[from] OrderApiError),

    #[error(transparent)]
    Store(#[from] partsync_core::StoreError),
}
