//! Normalized purchase-order payload sent to suppliers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{DropshipOrder, LineItem, ShippingAddress};

/// Billing block carrying the retailer's identity, never the customer's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingIdentity {
    pub business_name: String,
}

/// What the supplier sees. The customer is identified only by an opaque
/// reference; the shipping block keeps the recipient address so the package
/// arrives, while billing is the retailer's own identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOrderPayload {
    pub customer_reference: String,
    pub items: Vec<LineItem>,
    pub shipping: ShippingAddress,
    pub billing: BillingIdentity,
}

/// Opaque per-order customer reference, e.g. `APX-1A2B3C4D`.
#[must_use]
pub fn customer_reference(prefix: &str, internal_order_id: Uuid) -> String {
    let id = internal_order_id.simple().to_string();
    format!("{}-{}", prefix, id[..8].to_ascii_uppercase())
}

#[must_use]
pub fn build_payload(
    order: &DropshipOrder,
    reference_prefix: &str,
    business_name: &str,
) -> SupplierOrderPayload {
    SupplierOrderPayload {
        customer_reference: customer_reference(reference_prefix, order.internal_order_id),
        items: order.items.clone(),
        shipping: order.shipping_address.clone(),
        billing: BillingIdentity {
            business_name: business_name.to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::model::PaymentMethod;

    use super::*;

    fn order() -> DropshipOrder {
        DropshipOrder::new(
            vec![LineItem {
                product_id: "partspro:bk-2031".to_owned(),
                quantity: 1,
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
            PaymentMethod::Card,
        )
    }

    #[test]
    fn reference_is_prefixed_and_stable_per_order() {
        let o = order();
        let a = customer_reference("APX", o.internal_order_id);
        let b = customer_reference("APX", o.internal_order_id);
        assert_eq!(a, b);
        assert!(a.starts_with("APX-"));
        assert_eq!(a.len(), "APX-".len() + 8);
    }

    #[test]
    fn billing_block_carries_the_retailer_identity() {
        let payload = build_payload(&order(), "APX", "Apex Performance Parts LLC");
        assert_eq!(payload.billing.business_name, "Apex Performance Parts LLC");
        assert!(!payload.customer_reference.contains("Dana"));
    }

    #[test]
    fn shipping_block_keeps_the_recipient_address() {
        let payload = build_payload(&order(), "APX", "Apex Performance Parts LLC");
        assert_eq!(payload.shipping.recipient, "Dana Lee");
        assert_eq!(payload.shipping.postal_code, "78701");
    }
}
