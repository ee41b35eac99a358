use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use partsync_core::{CatalogProduct, MemoryCatalogStore, SupplierConfig, SupplierRegistry};
use rust_decimal::Decimal;

use crate::api::{OrderStatusSnapshot, SupplierCancelOutcome, SupplierConfirmation};
use crate::error::OrderApiError;
use crate::model::{DropshipOrder, LineItem, PaymentMethod, ShippingAddress};
use crate::outbox::NotificationEvent;
use crate::payload::SupplierOrderPayload;

use super::*;
use crate::api::SupplierOrderApi;

enum SubmitBehavior {
    Succeed,
    /// Fail with a transient error this many times, then succeed.
    FlakyThen(u32),
    FailWith(fn(supplier_id: &str) -> OrderApiError),
    Hang,
}

struct FakeApi {
    submit_behavior: SubmitBehavior,
    submit_calls: AtomicU32,
    cancel_accepted: bool,
    cancel_hangs: bool,
    cancel_calls: AtomicU32,
    statuses: Mutex<HashMap<String, OrderStatusSnapshot>>,
    hanging_statuses: Vec<String>,
}

impl FakeApi {
    fn new(submit_behavior: SubmitBehavior) -> Self {
        Self {
            submit_behavior,
            submit_calls: AtomicU32::new(0),
            cancel_accepted: true,
            cancel_hangs: false,
            cancel_calls: AtomicU32::new(0),
            statuses: Mutex::new(HashMap::new()),
            hanging_statuses: Vec::new(),
        }
    }

    fn with_status(self, snapshot: OrderStatusSnapshot) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(snapshot.supplier_order_id.clone(), snapshot);
        self
    }

    /// Status polls for this supplier order id never return.
    fn with_hanging_status(mut self, supplier_order_id: &str) -> Self {
        self.hanging_statuses.push(supplier_order_id.to_owned());
        self
    }

    fn refusing_cancellation(mut self) -> Self {
        self.cancel_accepted = false;
        self
    }

    fn with_hanging_cancel(mut self) -> Self {
        self.cancel_hangs = true;
        self
    }

    fn confirmation() -> SupplierConfirmation {
        SupplierConfirmation {
            supplier_order_id: "PP-55001".to_owned(),
            tracking_number: Some("1Z999".to_owned()),
            estimated_delivery: Some(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()),
        }
    }
}

impl SupplierOrderApi for FakeApi {
    async fn submit(
        &self,
        supplier_id: &str,
        _payload: &SupplierOrderPayload,
    ) -> Result<SupplierConfirmation, OrderApiError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match &self.submit_behavior {
            SubmitBehavior::Succeed => Ok(Self::confirmation()),
            SubmitBehavior::FlakyThen(failures) if n < *failures => {
                Err(OrderApiError::Unavailable {
                    supplier_id: supplier_id.to_owned(),
                    reason: "503".to_owned(),
                })
            }
            SubmitBehavior::FlakyThen(_) => Ok(Self::confirmation()),
            SubmitBehavior::FailWith(make) => Err(make(supplier_id)),
            SubmitBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung submit must be cut off by the timeout")
            }
        }
    }

    async fn get_status(
        &self,
        supplier_id: &str,
        supplier_order_id: &str,
    ) -> Result<OrderStatusSnapshot, OrderApiError> {
        if self.hanging_statuses.iter().any(|id| id == supplier_order_id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("hung status poll must be cut off by the timeout");
        }
        self.statuses
            .lock()
            .unwrap()
            .get(supplier_order_id)
            .cloned()
            .ok_or_else(|| OrderApiError::Unavailable {
                supplier_id: supplier_id.to_owned(),
                reason: "tracking endpoint down".to_owned(),
            })
    }

    async fn cancel(
        &self,
        _supplier_id: &str,
        _supplier_order_id: &str,
    ) -> Result<SupplierCancelOutcome, OrderApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.cancel_hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("hung cancellation must be cut off by the timeout");
        }
        Ok(SupplierCancelOutcome {
            accepted: self.cancel_accepted,
            refund_amount: Decimal::ZERO,
        })
    }
}

fn supplier(id: &str, enabled: bool, max_retries: u32) -> SupplierConfig {
    SupplierConfig {
        id: id.to_owned(),
        name: id.to_owned(),
        base_url: format!("https://{id}.example"),
        enabled,
        api_key: None,
        scrape_selectors: BTreeMap::new(),
        rate_limit: 60,
        max_retries,
        timeout_ms: 10_000,
    }
}

fn catalog_product(supplier: &str, external: &str) -> CatalogProduct {
    let now = Utc::now();
    CatalogProduct {
        id: format!("{supplier}:{external}"),
        supplier_id: supplier.to_owned(),
        external_id: external.to_owned(),
        title: "Ceramic Brake Pad Set".to_owned(),
        supplier_price: Decimal::new(4550, 2),
        resale_price: Decimal::new(5915, 2),
        category: Some("brakes".to_owned()),
        description: None,
        local_image_path: None,
        original_image_url: None,
        in_stock: true,
        stock_quantity: 12,
        last_price_update: now,
        last_synced_at: now,
    }
}

fn order(product_id: &str, payment: PaymentMethod) -> DropshipOrder {
    DropshipOrder::new(
        vec![LineItem {
            product_id: product_id.to_owned(),
            quantity: 2,
            unit_cost: Decimal::new(4550, 2),
        }],
        ShippingAddress {
            recipient: "Dana Lee".to_owned(),
            line1: "12 Piston Way".to_owned(),
            line2: None,
            city: "Austin".to_owned(),
            state: "TX".to_owned(),
            postal_code: "78701".to_owned(),
            country: "US".to_owned(),
        },
        payment,
    )
}

async fn forwarder_with(
    api: FakeApi,
    suppliers: Vec<SupplierConfig>,
) -> OrderForwarder<FakeApi, MemoryCatalogStore> {
    let store = MemoryCatalogStore::new();
    store
        .upsert_many(&[catalog_product("partspro", "bk-2031")])
        .await
        .unwrap();
    OrderForwarder::new(
        api,
        store,
        SupplierRegistry::new(suppliers),
        "APX",
        "Apex Performance Parts LLC",
        0,
    )
}

#[tokio::test]
async fn forwards_and_confirms_a_pending_order() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(outcome.success);
    assert_eq!(outcome.supplier_order_id.as_deref(), Some("PP-55001"));
    assert_eq!(o.status, OrderStatus::Confirmed);
    assert_eq!(o.supplier_id.as_deref(), Some("partspro"));
    assert_eq!(o.supplier_order_id.as_deref(), Some("PP-55001"));
    assert_eq!(o.tracking_number.as_deref(), Some("1Z999"));

    let events = fwd.outbox().drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        NotificationEvent::CustomerConfirmation { order_id, message }
            if *order_id == o.internal_order_id && message.contains("APX-")
    ));
}

#[tokio::test]
async fn unknown_product_fails_without_touching_the_api() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:no-such-part", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(o.status, OrderStatus::Failed);
    assert_eq!(fwd.api.submit_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        fwd.outbox().drain().as_slice(),
        [NotificationEvent::AdminAlert { .. }]
    ));
}

#[tokio::test]
async fn disabled_supplier_is_a_resolution_failure_not_a_retry() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", false, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(o.status, OrderStatus::Failed);
    assert_eq!(fwd.api.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transient_submission_errors_are_retried_until_success() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::FlakyThen(2)),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(outcome.success);
    assert_eq!(fwd.api.submit_calls.load(Ordering::SeqCst), 3);
    assert_eq!(o.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn retry_exhaustion_fails_the_order_and_alerts_admin() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::FailWith(|id| OrderApiError::Unavailable {
            supplier_id: id.to_owned(),
            reason: "503".to_owned(),
        })),
        vec![supplier("partspro", true, 2)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(!outcome.success);
    // max_retries=2 → 3 total attempts
    assert_eq!(fwd.api.submit_calls.load(Ordering::SeqCst), 3);
    assert_eq!(o.status, OrderStatus::Failed);
    assert!(matches!(
        fwd.outbox().drain().as_slice(),
        [NotificationEvent::AdminAlert { .. }]
    ));
}

#[tokio::test]
async fn rejection_is_final_and_never_retried() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::FailWith(|id| OrderApiError::Rejected {
            supplier_id: id.to_owned(),
            reason: "item discontinued".to_owned(),
        })),
        vec![supplier("partspro", true, 5)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(fwd.api.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(o.status, OrderStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn hung_submission_times_out_as_a_transient_failure() {
    let mut slow = supplier("partspro", true, 0);
    slow.timeout_ms = 500;
    let fwd = forwarder_with(FakeApi::new(SubmitBehavior::Hang), vec![slow]).await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.forward_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(o.status, OrderStatus::Failed);
    assert!(outcome.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn cancelling_a_pending_card_order_refunds_in_full() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    let outcome = fwd.cancel_order(&mut o).await;

    assert!(outcome.success);
    // 2 × 45.50
    assert_eq!(outcome.refund_amount, Decimal::new(9100, 2));
    assert_eq!(o.status, OrderStatus::Cancelled);
    // Never submitted, so the supplier is not involved.
    assert_eq!(fwd.api.cancel_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn crypto_orders_cancel_with_zero_refund() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Crypto);

    let outcome = fwd.cancel_order(&mut o).await;

    assert!(outcome.success);
    assert_eq!(outcome.refund_amount, Decimal::ZERO);
    assert_eq!(o.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);
    o.status = OrderStatus::Shipped;

    let outcome = fwd.cancel_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(outcome.refund_amount, Decimal::ZERO);
    assert_eq!(o.status, OrderStatus::Shipped);
    assert_eq!(fwd.api.cancel_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelling_twice_is_a_no_op_the_second_time() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);

    assert!(fwd.cancel_order(&mut o).await.success);
    let second = fwd.cancel_order(&mut o).await;
    assert!(!second.success);
    assert_eq!(second.refund_amount, Decimal::ZERO);
}

#[tokio::test]
async fn supplier_refusal_leaves_the_order_unchanged() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed).refusing_cancellation(),
        vec![supplier("partspro", true, 3)],
    )
    .await;
    let mut o = order("partspro:bk-2031", PaymentMethod::Card);
    fwd.forward_order(&mut o).await;
    assert_eq!(o.status, OrderStatus::Confirmed);

    let outcome = fwd.cancel_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(o.status, OrderStatus::Confirmed);
    assert_eq!(fwd.api.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tracking_sync_isolates_per_order_poll_failures() {
    let eta = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
    let api = FakeApi::new(SubmitBehavior::Succeed).with_status(OrderStatusSnapshot {
        supplier_order_id: "PP-1".to_owned(),
        status: OrderStatus::Shipped,
        tracking_number: Some("1Z111".to_owned()),
        estimated_delivery: Some(eta),
    });
    let fwd = forwarder_with(api, vec![supplier("partspro", true, 3)]).await;

    let mut shipped = order("partspro:bk-2031", PaymentMethod::Card);
    shipped.supplier_id = Some("partspro".to_owned());
    shipped.supplier_order_id = Some("PP-1".to_owned());
    shipped.status = OrderStatus::Confirmed;

    // No snapshot registered for PP-2: the poll errors.
    let mut broken = order("partspro:bk-2031", PaymentMethod::Card);
    broken.supplier_id = Some("partspro".to_owned());
    broken.supplier_order_id = Some("PP-2".to_owned());
    broken.status = OrderStatus::Confirmed;

    let mut orders = [shipped, broken];
    let updates = fwd.sync_tracking(&mut orders).await;

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, OrderStatus::Shipped);
    assert_eq!(updates[0].tracking_number.as_deref(), Some("1Z111"));
    assert_eq!(orders[0].status, OrderStatus::Shipped);
    assert_eq!(orders[0].estimated_delivery, Some(eta));
    // The failed poll left its order untouched.
    assert_eq!(orders[1].status, OrderStatus::Confirmed);
    assert!(orders[1].tracking_number.is_none());
}

#[tokio::test]
async fn tracking_sync_skips_unsubmitted_and_terminal_orders() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;

    let pending = order("partspro:bk-2031", PaymentMethod::Card);
    let mut cancelled = order("partspro:bk-2031", PaymentMethod::Card);
    cancelled.supplier_id = Some("partspro".to_owned());
    cancelled.supplier_order_id = Some("PP-9".to_owned());
    cancelled.status = OrderStatus::Cancelled;

    let mut orders = [pending, cancelled];
    let updates = fwd.sync_tracking(&mut orders).await;
    assert!(updates.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_tracking_poll_is_cut_off_and_the_batch_continues() {
    let eta = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
    let api = FakeApi::new(SubmitBehavior::Succeed)
        .with_hanging_status("PP-1")
        .with_status(OrderStatusSnapshot {
            supplier_order_id: "PP-2".to_owned(),
            status: OrderStatus::Shipped,
            tracking_number: Some("1Z222".to_owned()),
            estimated_delivery: Some(eta),
        });
    let mut slow = supplier("partspro", true, 3);
    slow.timeout_ms = 500;
    let fwd = forwarder_with(api, vec![slow]).await;

    let mut hung = order("partspro:bk-2031", PaymentMethod::Card);
    hung.supplier_id = Some("partspro".to_owned());
    hung.supplier_order_id = Some("PP-1".to_owned());
    hung.status = OrderStatus::Confirmed;

    let mut healthy = order("partspro:bk-2031", PaymentMethod::Card);
    healthy.supplier_id = Some("partspro".to_owned());
    healthy.supplier_order_id = Some("PP-2".to_owned());
    healthy.status = OrderStatus::Confirmed;

    let mut orders = [hung, healthy];
    let updates = fwd.sync_tracking(&mut orders).await;

    // The hung poll stops at timeout_ms and the next order is still polled.
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, OrderStatus::Shipped);
    assert_eq!(orders[0].status, OrderStatus::Confirmed);
    assert!(orders[0].tracking_number.is_none());
    assert_eq!(orders[1].status, OrderStatus::Shipped);
}

#[tokio::test(start_paused = true)]
async fn hung_cancellation_times_out_and_leaves_the_order_unchanged() {
    let api = FakeApi::new(SubmitBehavior::Succeed).with_hanging_cancel();
    let mut slow = supplier("partspro", true, 3);
    slow.timeout_ms = 500;
    let fwd = forwarder_with(api, vec![slow]).await;

    let mut o = order("partspro:bk-2031", PaymentMethod::Card);
    o.supplier_id = Some("partspro".to_owned());
    o.supplier_order_id = Some("PP-1".to_owned());
    o.status = OrderStatus::Confirmed;

    let outcome = fwd.cancel_order(&mut o).await;

    assert!(!outcome.success);
    assert_eq!(outcome.refund_amount, Decimal::ZERO);
    assert_eq!(o.status, OrderStatus::Confirmed);
    assert_eq!(fwd.api.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_status_poll_surfaces_as_a_timeout_from_track_order() {
    let api = FakeApi::new(SubmitBehavior::Succeed).with_hanging_status("PP-1");
    let mut slow = supplier("partspro", true, 3);
    slow.timeout_ms = 500;
    let fwd = forwarder_with(api, vec![slow]).await;

    let err = fwd.track_order("partspro", "PP-1").await.unwrap_err();
    assert!(matches!(
        err,
        crate::error::OrderError::Api(OrderApiError::Timeout { timeout_ms: 500, .. })
    ));
}

#[tokio::test]
async fn track_order_rejects_an_unconfigured_supplier() {
    let fwd = forwarder_with(
        FakeApi::new(SubmitBehavior::Succeed),
        vec![supplier("partspro", true, 3)],
    )
    .await;

    let err = fwd.track_order("ghost-supply", "PP-1").await.unwrap_err();
    assert!(matches!(
        err,
        crate::error::OrderError::SupplierResolution { .. }
    ));
}

#[tokio::test]
async fn track_order_returns_the_supplier_snapshot() {
    let api = FakeApi::new(SubmitBehavior::Succeed).with_status(OrderStatusSnapshot {
        supplier_order_id: "PP-1".to_owned(),
        status: OrderStatus::Confirmed,
        tracking_number: None,
        estimated_delivery: None,
    });
    let fwd = forwarder_with(api, vec![supplier("partspro", true, 3)]).await;

    let snapshot = fwd.track_order("partspro", "PP-1").await.unwrap();
    assert_eq!(snapshot.status, OrderStatus::Confirmed);

    let err = fwd.track_order("partspro", "PP-404").await.unwrap_err();
    assert!(matches!(err, crate::error::OrderError::Api(_)));
}
