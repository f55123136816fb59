use super::auth::Session;
use super::cart::{CartEntry, CartLine};
use super::chat::{ChatMessage, SessionId};
use super::order::{CheckoutRequest, NewOrder, Order, OrderStatus};
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Catalog rows, read-only from this system's perspective.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn all(&self) -> Result<Vec<Product>>;
    async fn get(&self, product_id: &str) -> Result<Option<Product>>;
}

/// Cart rows, scoped to the authenticated caller by the store's own
/// access-control policy.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Entries joined with their products, oldest first.
    async fn lines(&self) -> Result<Vec<CartLine>>;
    async fn find_by_product(&self, product_id: &str) -> Result<Option<CartEntry>>;
    async fn insert(&self, product_id: &str, quantity: u32) -> Result<()>;
    async fn set_quantity(&self, entry_id: &str, quantity: u32) -> Result<()>;
    async fn delete(&self, entry_id: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a fresh order as `Pending` and returns it with its
    /// store-assigned id.
    async fn insert(&self, order: NewOrder) -> Result<Order>;
    async fn get(&self, order_id: &str) -> Result<Option<Order>>;
    /// A user's orders, newest first.
    async fn for_user(&self, user_id: &str) -> Result<Vec<Order>>;
    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        payment_key: Option<&str>,
    ) -> Result<()>;
}

/// Append-only chat turn log.
#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<()>;
    async fn for_session(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>>;
}

/// The hosted platform's email+password authentication.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// May return no session when the backend defers to email confirmation.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_out(&self) -> Result<()>;
    async fn session(&self) -> Result<Option<Session>>;
    /// Change notifications, held for the life of the process and released
    /// on teardown.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// The payment provider's redirect-based checkout. Resolves when control
/// returns to the application; rejects on cancellation or failure.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_card_checkout(&self, request: &CheckoutRequest) -> Result<()>;
}

/// The storefront support completion endpoint.
#[async_trait]
pub trait SupportCompletion: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String>;
}

/// The single browser-local key holding the chat session identifier.
pub trait SessionVault: Send + Sync {
    fn load(&self) -> Result<Option<SessionId>>;
    fn store(&self, session_id: &SessionId) -> Result<()>;
}

pub type ProductStoreBox = Box<dyn ProductStore>;
pub type CartStoreBox = Box<dyn CartStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type ChatMessageStoreBox = Box<dyn ChatMessageStore>;
pub type AuthBackendBox = Box<dyn AuthBackend>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type SupportCompletionBox = Box<dyn SupportCompletion>;
pub type SessionVaultBox = Box<dyn SessionVault>;
