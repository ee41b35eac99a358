//! Pluggable supplier order API.
//!
//! Real supplier fulfillment APIs vary wildly; the forwarder only needs the
//! three calls below. Production bindings live outside this crate; tests run
//! against in-memory fakes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderApiError;
use crate::model::OrderStatus;
use crate::payload::SupplierOrderPayload;

/// Returned by the supplier on successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfirmation {
    pub supplier_order_id: String,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Read-only status snapshot from a tracking poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusSnapshot {
    pub supplier_order_id: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Supplier's answer to a cancellation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierCancelOutcome {
    pub accepted: bool,
    pub refund_amount: Decimal,
}

#[allow(async_fn_in_trait)]
pub trait SupplierOrderApi: Send + Sync {
    async fn submit(
        &self,
        supplier_id: &str,
        payload: &SupplierOrderPayload,
    ) -> Result<SupplierConfirmation, OrderApiError>;

    async fn get_status(
        &self,
        supplier_id: &str,
        supplier_order_id: &str,
    ) -> Result<OrderStatusSnapshot, OrderApiError>;

    async fn cancel(
        &self,
        supplier_id: &str,
        supplier_order_id: &str,
    ) -> Result<SupplierCancelOutcome, OrderApiError>;
}
