//! Dropship order forwarding.
//!
//! Checkout produces a [`DropshipOrder`]; the [`OrderForwarder`] resolves the
//! responsible supplier from the catalog, submits a normalized purchase
//! order through the pluggable [`SupplierOrderApi`], and owns the order's
//! status lifecycle, tracking polls, and cancellation policy. Notifications
//! go through an outbox, never directly to a mailer.

mod api;
mod error;
mod forwarder;
mod model;
mod outbox;
mod payload;

pub use api::{OrderStatusSnapshot, SupplierCancelOutcome, SupplierConfirmation, SupplierOrderApi};
pub use error::{OrderApiError, OrderError};
pub use forwarder::{CancelOutcome, ForwardOutcome, OrderForwarder, TrackingUpdate};
pub use model::{
    refund_amount, DropshipOrder, LineItem, OrderStatus, PaymentMethod, ShippingAddress,
};
pub use outbox::{NotificationEvent, NotificationOutbox};
pub use payload::{build_payload, customer_reference, BillingIdentity, SupplierOrderPayload};
