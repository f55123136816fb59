use crate::domain::auth::{Session, User};
use crate::domain::cart::{CartEntry, CartLine};
use crate::domain::chat::{ChatMessage, SessionId};
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::ports::{
    AuthBackend, CartStore, ChatMessageStore, OrderStore, ProductStore, SessionVault,
};
use crate::domain::product::Product;
use crate::error::{Result, StorefrontError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

/// In-memory catalog, seeded at startup (e.g. from a CSV file).
///
/// `Clone` shares the underlying rows, so a cart store can join against the
/// same catalog instance.
#[derive(Default, Clone)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn all(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products.clone())
    }

    async fn get(&self, product_id: &str) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == product_id).cloned())
    }
}

/// In-memory cart rows joined against a shared catalog.
#[derive(Clone)]
pub struct InMemoryCartStore {
    products: InMemoryProductStore,
    entries: Arc<RwLock<Vec<CartEntry>>>,
}

impl InMemoryCartStore {
    pub fn new(products: InMemoryProductStore) -> Self {
        Self {
            products,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn lines(&self) -> Result<Vec<CartLine>> {
        let entries = self.entries.read().await.clone();
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            let product = self.products.get(&entry.product_id).await?.ok_or_else(|| {
                StorefrontError::Store(format!("cart row references unknown product {}", entry.product_id))
            })?;
            lines.push(CartLine { entry, product });
        }
        Ok(lines)
    }

    async fn find_by_product(&self, product_id: &str) -> Result<Option<CartEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.product_id == product_id).cloned())
    }

    async fn insert(&self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::Validation(
                "수량은 1 이상이어야 합니다.".to_string(),
            ));
        }
        if self.products.get(product_id).await?.is_none() {
            return Err(StorefrontError::Validation(
                "상품을 찾을 수 없습니다.".to_string(),
            ));
        }

        let mut entries = self.entries.write().await;
        entries.push(CartEntry {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            quantity,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn set_quantity(&self, entry_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::Validation(
                "수량은 1 이상이어야 합니다.".to_string(),
            ));
        }
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.id == entry_id) {
            entry.quantity = quantity;
        }
        Ok(())
    }

    async fn delete(&self, entry_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.id != entry_id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// In-memory order rows. Orders are never deleted, only inserted and
/// status-updated.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        let stored = Order {
            id: Uuid::new_v4().to_string(),
            user_id: order.user_id,
            title: order.title,
            total: order.total.value(),
            status: OrderStatus::Pending,
            payment_key: None,
            items: order.items,
            created_at: Utc::now(),
        };
        self.orders.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<Order> = orders.iter().filter(|o| o.user_id == user_id).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        payment_key: Option<&str>,
    ) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| StorefrontError::OrderNotFound(order_id.to_string()))?;
        order.status = status;
        if let Some(key) = payment_key {
            order.payment_key = Some(key.to_string());
        }
        Ok(())
    }
}

/// Append-only in-memory chat log.
#[derive(Default, Clone)]
pub struct InMemoryChatLog {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl InMemoryChatLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatMessageStore for InMemoryChatLog {
    async fn append(&self, message: ChatMessage) -> Result<()> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn for_session(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect())
    }
}

struct AuthState {
    // email -> (password, user)
    users: HashMap<String, (String, User)>,
    current: Option<Session>,
}

/// Self-contained auth backend with email+password accounts and the same
/// change-notification shape as the hosted platform.
#[derive(Clone)]
pub struct InMemoryAuthBackend {
    state: Arc<RwLock<AuthState>>,
    changes: Arc<watch::Sender<Option<Session>>>,
}

impl InMemoryAuthBackend {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            state: Arc::new(RwLock::new(AuthState {
                users: HashMap::new(),
                current: None,
            })),
            changes: Arc::new(changes),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn issue_session(user: &User) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            user: user.clone(),
        }
    }
}

impl Default for InMemoryAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for InMemoryAuthBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let mut state = self.state.write().await;
        if state.users.contains_key(email) {
            return Err(StorefrontError::Auth(
                "이미 가입된 이메일입니다.".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: None,
        };
        state
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));

        // No email confirmation step here: a fresh session comes right back.
        let session = Self::issue_session(&user);
        state.current = Some(session.clone());
        self.changes.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.state.write().await;
        let session = match state.users.get(email) {
            Some((stored, user)) if stored == password => Self::issue_session(user),
            _ => {
                return Err(StorefrontError::Auth(
                    "이메일 또는 비밀번호가 올바르지 않습니다.".to_string(),
                ));
            }
        };
        state.current = Some(session.clone());
        self.changes.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.write().await.current = None;
        self.changes.send_replace(None);
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.state.read().await.current.clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}

/// Volatile session vault for tests.
#[derive(Default, Clone)]
pub struct InMemorySessionVault {
    slot: Arc<std::sync::RwLock<Option<SessionId>>>,
}

impl InMemorySessionVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionVault for InMemorySessionVault {
    fn load(&self) -> Result<Option<SessionId>> {
        match self.slot.read() {
            Ok(slot) => Ok(slot.clone()),
            Err(_) => Ok(None),
        }
    }

    fn store(&self, session_id: &SessionId) -> Result<()> {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(session_id.clone());
        }
        Ok(())
    }
}
