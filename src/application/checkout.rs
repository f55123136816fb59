use super::cart::CartService;
use crate::domain::auth::Session;
use crate::domain::cart::CheckoutDraft;
use crate::domain::order::{CheckoutRequest, NewOrder, Order, OrderStatus};
use crate::domain::ports::{OrderStoreBox, PaymentGatewayBox};
use crate::error::{Result, StorefrontError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Drives a purchase end to end: aggregate the cart, persist the order as
/// `Pending`, hand control to the payment gateway.
///
/// A processing flag rejects a second submission while one is in flight;
/// that flag is the only concurrency control here. Nothing spans
/// order-insert + gateway-invoke + status-update as a unit, and no call
/// carries a timeout or cancellation token.
pub struct CheckoutFlow {
    cart: Arc<CartService>,
    orders: OrderStoreBox,
    gateway: PaymentGatewayBox,
    success_url: String,
    fail_url: String,
    processing: AtomicBool,
}

impl CheckoutFlow {
    pub fn new(
        cart: Arc<CartService>,
        orders: OrderStoreBox,
        gateway: PaymentGatewayBox,
        success_url: impl Into<String>,
        fail_url: impl Into<String>,
    ) -> Self {
        Self {
            cart,
            orders,
            gateway,
            success_url: success_url.into(),
            fail_url: fail_url.into(),
            processing: AtomicBool::new(false),
        }
    }

    /// Runs the checkout for the signed-in user. Returns the created order,
    /// still `Pending` when the gateway accepted the invocation (the
    /// provider redirect completes it out of band).
    pub async fn buy_now(&self, session: Option<&Session>) -> Result<Order> {
        let Some(session) = session else {
            return Err(StorefrontError::Validation(
                "로그인이 필요합니다. 결제하려면 먼저 로그인해 주세요.".to_string(),
            ));
        };

        if self.processing.swap(true, Ordering::SeqCst) {
            return Err(StorefrontError::Validation(
                "이미 결제가 진행 중입니다.".to_string(),
            ));
        }
        let result = self.run(session).await;
        self.processing.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, session: &Session) -> Result<Order> {
        let lines = self.cart.lines().await?;
        let draft = CheckoutDraft::from_lines(&lines)?;

        let order = self
            .orders
            .insert(NewOrder {
                user_id: session.user.id.clone(),
                title: draft.title.clone(),
                total: draft.amount,
                items: draft.items,
            })
            .await?;

        let request = CheckoutRequest {
            amount: draft.amount,
            order_id: order.id.clone(),
            order_name: draft.title,
            customer_name: session.user.customer_name(),
            success_url: self.success_url.clone(),
            fail_url: self.fail_url.clone(),
        };

        if let Err(gateway_error) = self.gateway.request_card_checkout(&request).await {
            // A cancelled checkout must not leave the order pending. The
            // failure mark itself is best-effort: if it also fails the order
            // stays stuck and only the diagnostic log knows.
            if let Err(update_error) = self
                .orders
                .update_status(&order.id, OrderStatus::Failed, None)
                .await
            {
                tracing::warn!(
                    order_id = %order.id,
                    error = %update_error,
                    "could not mark cancelled order as failed"
                );
            }
            return Err(gateway_error);
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::User;
    use crate::domain::ports::OrderStore;
    use crate::infrastructure::gateway::StaticGateway;
    use crate::infrastructure::in_memory::{
        InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::Notify;

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            user: User {
                id: "user-1".to_string(),
                email: "a@b.co".to_string(),
                display_name: Some("홍길동".to_string()),
            },
        }
    }

    async fn cart_with_one_item() -> Arc<CartService> {
        let products = InMemoryProductStore::seeded(vec![crate::domain::product::Product {
            id: "p1".to_string(),
            name: "무지 토트백".to_string(),
            description: String::new(),
            price: dec!(49.99),
            image_url: None,
            category: "bags".to_string(),
            created_at: Utc::now(),
        }]);
        let cart = Arc::new(CartService::new(Box::new(InMemoryCartStore::new(products))));
        cart.add("p1", 2).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_checkout_requires_a_signed_in_user() {
        let flow = CheckoutFlow::new(
            cart_with_one_item().await,
            Box::new(InMemoryOrderStore::new()),
            Box::new(StaticGateway::redirecting()),
            "http://localhost:5173/payment/success",
            "http://localhost:5173/payment/fail",
        );

        assert!(matches!(
            flow.buy_now(None).await,
            Err(StorefrontError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_accepted_checkout_leaves_order_pending() {
        let orders = InMemoryOrderStore::new();
        let gateway = StaticGateway::redirecting();
        let requests = gateway.requests_handle();
        let flow = CheckoutFlow::new(
            cart_with_one_item().await,
            Box::new(orders.clone()),
            Box::new(gateway),
            "http://localhost:5173/payment/success",
            "http://localhost:5173/payment/fail",
        );

        let order = flow.buy_now(Some(&session())).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, dec!(100));
        let sent = requests.read().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].order_id, order.id);
        assert_eq!(sent[0].customer_name, "홍길동");
    }

    #[tokio::test]
    async fn test_cancelled_checkout_marks_the_order_failed() {
        let orders = InMemoryOrderStore::new();
        let flow = CheckoutFlow::new(
            cart_with_one_item().await,
            Box::new(orders.clone()),
            Box::new(StaticGateway::cancelling("결제가 취소되었습니다.")),
            "http://localhost:5173/payment/success",
            "http://localhost:5173/payment/fail",
        );

        let result = flow.buy_now(Some(&session())).await;
        assert!(matches!(result, Err(StorefrontError::Gateway(_))));

        let stored = orders.for_user("user-1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, OrderStatus::Failed);
    }

    /// Gateway that parks inside the invocation until released, so a second
    /// submission can overlap the first.
    struct ParkedGateway {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl crate::domain::ports::PaymentGateway for ParkedGateway {
        async fn request_card_checkout(&self, _request: &CheckoutRequest) -> Result<()> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_overlapping_submission_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let flow = Arc::new(CheckoutFlow::new(
            cart_with_one_item().await,
            Box::new(InMemoryOrderStore::new()),
            Box::new(ParkedGateway {
                entered: entered.clone(),
                release: release.clone(),
            }),
            "http://localhost:5173/payment/success",
            "http://localhost:5173/payment/fail",
        ));

        let first = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.buy_now(Some(&session())).await })
        };
        entered.notified().await;

        let second = flow.buy_now(Some(&session())).await;
        assert!(matches!(second, Err(StorefrontError::Validation(_))));

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
    }
}
