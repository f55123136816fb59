use crate::domain::order::{Order, PaymentOutcome, PaymentRedirect};
use crate::domain::ports::OrderStoreBox;
use crate::error::{Result, StorefrontError};

/// Applies a payment redirect outcome to the order it names:
/// `Pending` → `Completed` (keeping the provider transaction key when one
/// came back) or `Pending` → `Failed`.
///
/// There is no automatic retry: a store failure here leaves the order
/// pending until a human or a later run corrects it.
pub struct OrderReconciler {
    orders: OrderStoreBox,
}

impl OrderReconciler {
    pub fn new(orders: OrderStoreBox) -> Self {
        Self { orders }
    }

    pub async fn reconcile(&self, redirect: &PaymentRedirect) -> Result<Order> {
        let mut order = self
            .orders
            .get(&redirect.order_id)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(redirect.order_id.clone()))?;

        match redirect.outcome {
            PaymentOutcome::Success => order.complete(redirect.payment_key.clone())?,
            PaymentOutcome::Fail => order.fail()?,
        }

        self.orders
            .update_status(&order.id, order.status, order.payment_key.as_deref())
            .await?;
        Ok(order)
    }
}
