use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use storefront::application::auth::AuthContext;
use storefront::application::cart::CartService;
use storefront::application::checkout::CheckoutFlow;
use storefront::application::reconcile::OrderReconciler;
use storefront::domain::auth::Session;
use storefront::domain::order::{NewOrder, Order, OrderStatus};
use storefront::domain::ports::OrderStore;
use storefront::domain::product::Product;
use storefront::error::{Result, StorefrontError};
use storefront::infrastructure::gateway::StaticGateway;
use storefront::infrastructure::in_memory::{
    InMemoryAuthBackend, InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore,
};
use storefront::interfaces::redirect::parse_return_url;

fn product(id: &str, name: &str, price: rust_decimal::Decimal) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        price,
        image_url: None,
        category: "bags".to_string(),
        created_at: Utc::now(),
    }
}

async fn signed_in_session() -> Session {
    let auth = AuthContext::new(Box::new(InMemoryAuthBackend::new()));
    auth.init().await.unwrap();
    auth.sign_up("buyer@example.com", "secret")
        .await
        .unwrap()
        .unwrap()
}

async fn filled_cart(products: InMemoryProductStore) -> Arc<CartService> {
    let cart = Arc::new(CartService::new(Box::new(InMemoryCartStore::new(products))));
    cart.add("p1", 2).await.unwrap();
    cart.add("p2", 1).await.unwrap();
    cart
}

#[tokio::test]
async fn test_full_purchase_settles_as_completed() {
    let products = InMemoryProductStore::seeded(vec![
        product("p1", "무지 토트백", dec!(49.99)),
        product("p2", "숄더 스트랩", dec!(10.00)),
    ]);
    let orders = InMemoryOrderStore::new();
    let session = signed_in_session().await;

    let flow = CheckoutFlow::new(
        filled_cart(products).await,
        Box::new(orders.clone()),
        Box::new(StaticGateway::redirecting()),
        "http://localhost:5173/payment/success",
        "http://localhost:5173/payment/fail",
    );
    let order = flow.buy_now(Some(&session)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, dec!(110));
    assert_eq!(order.title, "무지 토트백 외 1건");

    // The provider redirects the browser back to the success page.
    let redirect = parse_return_url(&format!(
        "http://localhost:5173/payment/success?orderId={}&paymentKey=pay_k",
        order.id
    ))
    .unwrap();
    let reconciler = OrderReconciler::new(Box::new(orders.clone()));
    let settled = reconciler.reconcile(&redirect).await.unwrap();

    assert_eq!(settled.status, OrderStatus::Completed);
    assert_eq!(settled.payment_key.as_deref(), Some("pay_k"));

    // A stale fail redirect for the same order must not undo the purchase.
    let stale = parse_return_url(&format!(
        "http://localhost:5173/payment/fail?orderId={}",
        order.id
    ))
    .unwrap();
    assert!(matches!(
        reconciler.reconcile(&stale).await,
        Err(StorefrontError::InvalidTransition { .. })
    ));
    let stored = orders.get(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Completed);
}

#[tokio::test]
async fn test_cancelled_invocation_never_leaves_a_pending_order() {
    let products = InMemoryProductStore::seeded(vec![
        product("p1", "무지 토트백", dec!(49.99)),
        product("p2", "숄더 스트랩", dec!(10.00)),
    ]);
    let orders = InMemoryOrderStore::new();
    let session = signed_in_session().await;

    let flow = CheckoutFlow::new(
        filled_cart(products).await,
        Box::new(orders.clone()),
        Box::new(StaticGateway::cancelling("결제가 취소되었습니다.")),
        "http://localhost:5173/payment/success",
        "http://localhost:5173/payment/fail",
    );

    let result = flow.buy_now(Some(&session)).await;
    assert!(matches!(result, Err(StorefrontError::Gateway(_))));

    let stored = orders.for_user(&session.user.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, OrderStatus::Failed);
}

/// Order store that counts every call, to show the result-page flow never
/// touches the store when the return URL is unusable.
#[derive(Clone)]
struct CountingOrders {
    inner: InMemoryOrderStore,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl OrderStore for CountingOrders {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(order).await
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(order_id).await
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.for_user(user_id).await
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        payment_key: Option<&str>,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(order_id, status, payment_key).await
    }
}

#[tokio::test]
async fn test_unusable_return_url_issues_no_store_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = CountingOrders {
        inner: InMemoryOrderStore::new(),
        calls: calls.clone(),
    };
    let reconciler = OrderReconciler::new(Box::new(store));

    for url in [
        "/payment/success",
        "/payment/success?paymentKey=pay_k",
        "/payment/refunded?orderId=order-1",
        "/orders?orderId=order-1",
    ] {
        if let Ok(redirect) = parse_return_url(url) {
            reconciler.reconcile(&redirect).await.ok();
        }
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
