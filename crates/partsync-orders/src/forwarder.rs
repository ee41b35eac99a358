//! Order forwarding: resolve the supplier, submit, track, cancel.

use std::time::Duration;

use chrono::{DateTime, Utc};
use partsync_core::{CatalogStore, SupplierConfig, SupplierRegistry};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::{OrderStatusSnapshot, SupplierConfirmation, SupplierOrderApi};
use crate::error::{OrderApiError, OrderError};
use crate::model::{refund_amount, DropshipOrder, OrderStatus};
use crate::outbox::{NotificationEvent, NotificationOutbox};
use crate::payload::{build_payload, SupplierOrderPayload};

/// Result of one forwarding attempt, mirroring what the storefront needs to
/// show at checkout.
#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    pub success: bool,
    pub supplier_order_id: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ForwardOutcome {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            supplier_order_id: None,
            tracking_number: None,
            estimated_delivery: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub success: bool,
    pub refund_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct TrackingUpdate {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

pub struct OrderForwarder<A, S> {
    api: A,
    store: S,
    registry: SupplierRegistry,
    outbox: NotificationOutbox,
    reference_prefix: String,
    business_name: String,
    backoff_base_ms: u64,
}

impl<A: SupplierOrderApi, S: CatalogStore> OrderForwarder<A, S> {
    #[must_use]
    pub fn new(
        api: A,
        store: S,
        registry: SupplierRegistry,
        reference_prefix: impl Into<String>,
        business_name: impl Into<String>,
        backoff_base_ms: u64,
    ) -> Self {
        Self {
            api,
            store,
            registry,
            outbox: NotificationOutbox::new(),
            reference_prefix: reference_prefix.into(),
            business_name: business_name.into(),
            backoff_base_ms,
        }
    }

    #[must_use]
    pub fn outbox(&self) -> &NotificationOutbox {
        &self.outbox
    }

    /// Forwards a pending order to its supplier.
    ///
    /// Supplier resolution errors are final and never retried. Submission is
    /// retried up to `supplier.max_retries` on transient API errors; on
    /// exhaustion the order moves to `Failed` and an admin alert is queued.
    /// On success the supplier's ids are persisted on the order and a
    /// customer confirmation is queued. Notification delivery is someone
    /// else's problem; queue failures cannot happen here.
    pub async fn forward_order(&self, order: &mut DropshipOrder) -> ForwardOutcome {
        let supplier = match self.resolve_supplier(order).await {
            Ok(supplier) => supplier,
            Err(e) => {
                tracing::error!(order = %order.internal_order_id, error = %e, "supplier resolution failed");
                return self.fail_order(order, &e.to_string());
            }
        };
        order.supplier_id = Some(supplier.id.clone());

        let payload = build_payload(order, &self.reference_prefix, &self.business_name);
        if let Err(e) = order.transition(OrderStatus::Submitted) {
            return ForwardOutcome::failure(e.to_string());
        }

        let confirmation = match self.submit_with_retry(supplier, &payload).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::error!(
                    order = %order.internal_order_id,
                    supplier = %supplier.id,
                    error = %e,
                    "order submission exhausted retries"
                );
                return self.fail_order(order, &e.to_string());
            }
        };

        order.supplier_order_id = Some(confirmation.supplier_order_id.clone());
        order.tracking_number = confirmation.tracking_number.clone();
        order.estimated_delivery = confirmation.estimated_delivery;
        if let Err(e) = order.transition(OrderStatus::Confirmed) {
            return ForwardOutcome::failure(e.to_string());
        }

        self.outbox.push(NotificationEvent::CustomerConfirmation {
            order_id: order.internal_order_id,
            message: format!(
                "Your {} order {} is confirmed with the supplier{}.",
                self.business_name,
                payload.customer_reference,
                confirmation
                    .estimated_delivery
                    .map(|eta| format!(", estimated delivery {}", eta.format("%Y-%m-%d")))
                    .unwrap_or_default()
            ),
        });
        tracing::info!(
            order = %order.internal_order_id,
            supplier = %supplier.id,
            supplier_order = %confirmation.supplier_order_id,
            "order forwarded"
        );

        ForwardOutcome {
            success: true,
            supplier_order_id: Some(confirmation.supplier_order_id),
            tracking_number: confirmation.tracking_number,
            estimated_delivery: confirmation.estimated_delivery,
            error: None,
        }
    }

    /// Read-only status poll for one supplier order, bounded by the
    /// supplier's configured timeout.
    ///
    /// # Errors
    ///
    /// [`OrderError::SupplierResolution`] if the supplier id is not in the
    /// configuration; API failures and timeouts as [`OrderError::Api`].
    pub async fn track_order(
        &self,
        supplier_id: &str,
        supplier_order_id: &str,
    ) -> Result<OrderStatusSnapshot, OrderError> {
        let supplier = self.configured_supplier(supplier_id).ok_or_else(|| {
            OrderError::SupplierResolution {
                order_id: supplier_order_id.to_owned(),
                reason: format!("unknown supplier '{supplier_id}'"),
            }
        })?;
        Ok(self
            .timed(supplier, self.api.get_status(supplier_id, supplier_order_id))
            .await?)
    }

    /// Polls tracking for every submitted order in the batch. A poll failure
    /// for one order is logged and skipped; the rest continue.
    pub async fn sync_tracking(&self, orders: &mut [DropshipOrder]) -> Vec<TrackingUpdate> {
        let mut updates = Vec::new();
        for order in orders.iter_mut() {
            let (Some(supplier_id), Some(supplier_order_id)) =
                (order.supplier_id.as_deref(), order.supplier_order_id.as_deref())
            else {
                continue;
            };
            if order.status.is_terminal() {
                continue;
            }

            let Some(supplier) = self.configured_supplier(supplier_id) else {
                tracing::warn!(
                    order = %order.internal_order_id,
                    supplier = supplier_id,
                    "order references an unconfigured supplier; skipping poll"
                );
                continue;
            };

            let snapshot = match self
                .timed(supplier, self.api.get_status(supplier_id, supplier_order_id))
                .await
            {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(
                        order = %order.internal_order_id,
                        supplier = supplier_id,
                        error = %e,
                        "tracking poll failed; continuing with remaining orders"
                    );
                    continue;
                }
            };

            if snapshot.tracking_number.is_some() {
                order.tracking_number = snapshot.tracking_number.clone();
            }
            if snapshot.estimated_delivery.is_some() {
                order.estimated_delivery = snapshot.estimated_delivery;
            }
            if snapshot.status != order.status {
                if let Err(e) = order.transition(snapshot.status) {
                    tracing::warn!(
                        order = %order.internal_order_id,
                        error = %e,
                        "supplier reported a status we cannot apply"
                    );
                    continue;
                }
            }
            updates.push(TrackingUpdate {
                order_id: order.internal_order_id,
                status: order.status,
                tracking_number: order.tracking_number.clone(),
            });
        }
        updates
    }

    /// Attempts cancellation.
    ///
    /// A no-op returning `success: false` for orders already terminal
    /// (shipped, cancelled, or failed). For submitted orders the supplier is
    /// asked first; a supplier-side failure leaves the order untouched.
    /// Refunds follow payment policy: crypto never refunds, card refunds the
    /// full total before shipment.
    pub async fn cancel_order(&self, order: &mut DropshipOrder) -> CancelOutcome {
        if order.status.is_terminal() {
            tracing::info!(
                order = %order.internal_order_id,
                status = %order.status,
                "cancellation refused for terminal order"
            );
            return CancelOutcome {
                success: false,
                refund_amount: Decimal::ZERO,
            };
        }

        if let (Some(supplier_id), Some(supplier_order_id)) =
            (order.supplier_id.as_deref(), order.supplier_order_id.as_deref())
        {
            let Some(supplier) = self.configured_supplier(supplier_id) else {
                tracing::warn!(
                    order = %order.internal_order_id,
                    supplier = supplier_id,
                    "order references an unconfigured supplier; cancellation refused"
                );
                return CancelOutcome {
                    success: false,
                    refund_amount: Decimal::ZERO,
                };
            };
            match self
                .timed(supplier, self.api.cancel(supplier_id, supplier_order_id))
                .await
            {
                Ok(outcome) if outcome.accepted => {}
                Ok(_) => {
                    tracing::warn!(
                        order = %order.internal_order_id,
                        supplier = supplier_id,
                        "supplier refused cancellation"
                    );
                    return CancelOutcome {
                        success: false,
                        refund_amount: Decimal::ZERO,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        order = %order.internal_order_id,
                        supplier = supplier_id,
                        error = %e,
                        "supplier cancellation call failed; order left unchanged"
                    );
                    return CancelOutcome {
                        success: false,
                        refund_amount: Decimal::ZERO,
                    };
                }
            }
        }

        let refund = refund_amount(order);
        // Terminal states were rejected above, so this transition is legal.
        let _ = order.transition(OrderStatus::Cancelled);
        tracing::info!(
            order = %order.internal_order_id,
            refund = %refund,
            "order cancelled"
        );
        CancelOutcome {
            success: true,
            refund_amount: refund,
        }
    }

    /// The supplier comes from the first line item's catalog product. All
    /// items in one dropship order belong to the same supplier; checkout
    /// splits mixed carts upstream.
    async fn resolve_supplier(&self, order: &DropshipOrder) -> Result<&SupplierConfig, OrderError> {
        let order_id = order.internal_order_id.to_string();
        let first = order
            .items
            .first()
            .ok_or_else(|| OrderError::SupplierResolution {
                order_id: order_id.clone(),
                reason: "order has no line items".to_owned(),
            })?;

        let product = self
            .store
            .find_product(&first.product_id)
            .await?
            .ok_or_else(|| OrderError::SupplierResolution {
                order_id: order_id.clone(),
                reason: format!("product '{}' not in catalog", first.product_id),
            })?;

        self.registry
            .validate(&product.supplier_id)
            .map_err(|e| OrderError::SupplierResolution {
                order_id,
                reason: e.to_string(),
            })
    }

    /// Tracking and cancellation act on orders already placed, so this lookup
    /// ignores the enabled flag; only an id missing from the configuration
    /// comes back as `None`.
    fn configured_supplier(&self, supplier_id: &str) -> Option<&SupplierConfig> {
        self.registry
            .all_suppliers()
            .iter()
            .find(|s| s.id == supplier_id)
    }

    /// Bounds one supplier API call by the supplier's `timeout_ms`. A hung
    /// call surfaces as [`OrderApiError::Timeout`], which is transient.
    async fn timed<T>(
        &self,
        supplier: &SupplierConfig,
        call: impl std::future::Future<Output = Result<T, OrderApiError>>,
    ) -> Result<T, OrderApiError> {
        match tokio::time::timeout(Duration::from_millis(supplier.timeout_ms), call).await {
            Ok(result) => result,
            Err(_) => Err(OrderApiError::Timeout {
                supplier_id: supplier.id.clone(),
                timeout_ms: supplier.timeout_ms,
            }),
        }
    }

    async fn submit_with_retry(
        &self,
        supplier: &SupplierConfig,
        payload: &SupplierOrderPayload,
    ) -> Result<SupplierConfirmation, OrderApiError> {
        const MAX_DELAY_MS: u64 = 60_000;
        let mut attempt = 0u32;
        loop {
            let result = self
                .timed(supplier, self.api.submit(&supplier.id, payload))
                .await;

            match result {
                Ok(confirmation) => return Ok(confirmation),
                Err(err) => {
                    if !err.is_retriable() || attempt >= supplier.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let computed = self
                        .backoff_base_ms
                        .saturating_mul(1u64 << (attempt - 1).min(10));
                    let capped = computed.min(MAX_DELAY_MS);
                    #[allow(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss,
                        clippy::cast_precision_loss
                    )]
                    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                    tracing::warn!(
                        supplier = %supplier.id,
                        attempt,
                        max_retries = supplier.max_retries,
                        delay_ms,
                        error = %err,
                        "transient submission error — retrying after back-off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    fn fail_order(&self, order: &mut DropshipOrder, reason: &str) -> ForwardOutcome {
        // Failed is legal from Pending and Submitted, the only states this
        // is called from.
        let _ = order.transition(OrderStatus::Failed);
        self.outbox.push(NotificationEvent::AdminAlert {
            message: format!(
                "Order {} failed to forward: {reason}",
                order.internal_order_id
            ),
        });
        ForwardOutcome::failure(reason.to_owned())
    }
}

#[cfg(test)]
#[path = "forwarder_test.rs"]
mod tests;
