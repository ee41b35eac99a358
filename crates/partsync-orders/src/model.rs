//! Dropship order model and status state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

/// Lifecycle of one forwarded order. Transitions are one-directional;
/// `Cancelled` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Submitted,
    Confirmed,
    Shipped,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// `Shipped`, `Cancelled` and `Failed` admit no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Shipped | Self::Cancelled | Self::Failed)
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Submitted)
            | (Self::Submitted, Self::Confirmed)
            | (Self::Confirmed, Self::Shipped)
            | (Self::Pending | Self::Submitted, Self::Failed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Crypto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product id (`supplier_id:external_id`).
    pub product_id: String,
    pub quantity: u32,
    pub unit_cost: Decimal,
}

/// One order-forwarding attempt, created at customer checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropshipOrder {
    pub internal_order_id: Uuid,
    /// Resolved from the first line item's catalog product.
    pub supplier_id: Option<String>,
    /// Assigned by the supplier on successful submission.
    pub supplier_order_id: Option<String>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DropshipOrder {
    #[must_use]
    pub fn new(
        items: Vec<LineItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            internal_order_id: Uuid::new_v4(),
            supplier_id: None,
            supplier_order_id: None,
            items,
            shipping_address,
            payment_method,
            status: OrderStatus::Pending,
            tracking_number: None,
            estimated_delivery: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_cost * Decimal::from(item.quantity))
            .sum()
    }

    /// Moves the order to `next`, enforcing state-machine legality.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::IllegalTransition`] when the move is not
    /// permitted from the current status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(
            order = %self.internal_order_id,
            from = %self.status,
            to = %next,
            "order status transition"
        );
        self.status = next;
        Ok(())
    }
}

/// Refund owed on cancellation. Crypto payments are never refundable; card
/// payments refund the full order total when cancellation happens before
/// shipment. Callers must not invoke this for orders already shipped.
#[must_use]
pub fn refund_amount(order: &DropshipOrder) -> Decimal {
    match order.payment_method {
        PaymentMethod::Crypto => Decimal::ZERO,
        PaymentMethod::Card => order.total(),
    }
}
