use crate::domain::auth::{Session, User};
use crate::domain::cart::{CartEntry, CartLine};
use crate::domain::chat::{ChatMessage, SessionId};
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::ports::{
    AuthBackend, CartStore, ChatMessageStore, OrderStore, ProductStore,
};
use crate::domain::product::Product;
use crate::error::{Result, StorefrontError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

/// Client for the hosted data/auth platform.
///
/// Implements every store port plus the auth backend over the platform's
/// row-filter REST dialect, so one configured instance can be boxed once per
/// consumer (`Clone` shares the HTTP client and the signed-in state). Row
/// access control is the platform's job: requests carry the publishable key
/// and, once signed in, the session's bearer token.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    current: Arc<std::sync::RwLock<Option<Session>>>,
    changes: Arc<watch::Sender<Option<Session>>>,
}

#[derive(Deserialize)]
struct CartRow {
    id: String,
    product_id: String,
    quantity: u32,
    created_at: DateTime<Utc>,
    product: Option<Product>,
}

#[derive(Deserialize)]
struct AuthUserPayload {
    id: String,
    email: Option<String>,
    user_metadata: Option<UserMetadata>,
}

#[derive(Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
}

#[derive(Deserialize)]
struct AuthSessionPayload {
    access_token: Option<String>,
    user: Option<AuthUserPayload>,
}

impl From<AuthUserPayload> for User {
    fn from(payload: AuthUserPayload) -> Self {
        Self {
            id: payload.id,
            email: payload.email.unwrap_or_default(),
            display_name: payload.user_metadata.and_then(|m| m.full_name),
        }
    }
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            current: Arc::new(std::sync::RwLock::new(None)),
            changes: Arc::new(changes),
        }
    }

    fn rows_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        self.current
            .read()
            .ok()
            .and_then(|current| current.as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn set_current(&self, session: Option<Session>) {
        if let Ok(mut current) = self.current.write() {
            *current = session.clone();
        }
        self.changes.send_replace(session);
    }

    async fn store_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(StorefrontError::Store(format!("{status}: {body}")))
    }

    async fn auth_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(StorefrontError::Auth(format!("{status}: {body}")))
    }

    fn session_from_payload(payload: AuthSessionPayload) -> Option<Session> {
        let access_token = payload.access_token?;
        let user = payload.user?;
        Some(Session {
            access_token,
            user: user.into(),
        })
    }
}

#[async_trait]
impl ProductStore for RestBackend {
    async fn all(&self) -> Result<Vec<Product>> {
        let response = self
            .authed(self.http.get(self.rows_url("products")))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .send()
            .await?;
        Ok(Self::store_response(response).await?.json().await?)
    }

    async fn get(&self, product_id: &str) -> Result<Option<Product>> {
        let filter = format!("eq.{product_id}");
        let response = self
            .authed(self.http.get(self.rows_url("products")))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<Product> = Self::store_response(response).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }
}

#[async_trait]
impl CartStore for RestBackend {
    async fn lines(&self) -> Result<Vec<CartLine>> {
        let response = self
            .authed(self.http.get(self.rows_url("cart")))
            .query(&[
                ("select", "*,product:products(*)"),
                ("order", "created_at.asc"),
            ])
            .send()
            .await?;
        let rows: Vec<CartRow> = Self::store_response(response).await?.json().await?;

        rows.into_iter()
            .map(|row| {
                let product = row.product.ok_or_else(|| {
                    StorefrontError::Store(format!(
                        "cart row references unknown product {}",
                        row.product_id
                    ))
                })?;
                Ok(CartLine {
                    entry: CartEntry {
                        id: row.id,
                        product_id: row.product_id,
                        quantity: row.quantity,
                        created_at: row.created_at,
                    },
                    product,
                })
            })
            .collect()
    }

    async fn find_by_product(&self, product_id: &str) -> Result<Option<CartEntry>> {
        let filter = format!("eq.{product_id}");
        let response = self
            .authed(self.http.get(self.rows_url("cart")))
            .query(&[("select", "*"), ("product_id", filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<CartEntry> = Self::store_response(response).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert(&self, product_id: &str, quantity: u32) -> Result<()> {
        let response = self
            .authed(self.http.post(self.rows_url("cart")))
            .header("Prefer", "return=minimal")
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }

    async fn set_quantity(&self, entry_id: &str, quantity: u32) -> Result<()> {
        let response = self
            .authed(self.http.patch(self.rows_url("cart")))
            .query(&[("id", &format!("eq.{entry_id}"))])
            .json(&json!({ "quantity": quantity }))
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }

    async fn delete(&self, entry_id: &str) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.rows_url("cart")))
            .query(&[("id", &format!("eq.{entry_id}"))])
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.rows_url("cart")))
            .query(&[("id", "neq.")])
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        let response = self
            .authed(self.http.post(self.rows_url("orders")))
            .header("Prefer", "return=representation")
            .json(&json!({
                "user_id": order.user_id,
                "title": order.title,
                "total": order.total,
                "status": OrderStatus::Pending,
                "items": order.items,
            }))
            .send()
            .await?;
        let mut rows: Vec<Order> = Self::store_response(response).await?.json().await?;
        if rows.is_empty() {
            return Err(StorefrontError::Store(
                "주문을 생성하지 못했습니다.".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let filter = format!("eq.{order_id}");
        let response = self
            .authed(self.http.get(self.rows_url("orders")))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<Order> = Self::store_response(response).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let filter = format!("eq.{user_id}");
        let response = self
            .authed(self.http.get(self.rows_url("orders")))
            .query(&[
                ("select", "*"),
                ("user_id", filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        Ok(Self::store_response(response).await?.json().await?)
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        payment_key: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({ "status": status });
        if let Some(key) = payment_key {
            payload["payment_key"] = json!(key);
        }

        let response = self
            .authed(self.http.patch(self.rows_url("orders")))
            .query(&[("id", &format!("eq.{order_id}"))])
            .json(&payload)
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatMessageStore for RestBackend {
    async fn append(&self, message: ChatMessage) -> Result<()> {
        let response = self
            .authed(self.http.post(self.rows_url("chat_messages")))
            .header("Prefer", "return=minimal")
            .json(&message)
            .send()
            .await?;
        Self::store_response(response).await?;
        Ok(())
    }

    async fn for_session(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let filter = format!("eq.{session_id}");
        let response = self
            .authed(self.http.get(self.rows_url("chat_messages")))
            .query(&[
                ("select", "*"),
                ("session_id", filter.as_str()),
                ("order", "created_at.asc"),
            ])
            .send()
            .await?;
        Ok(Self::store_response(response).await?.json().await?)
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .authed(self.http.post(self.auth_url("signup")))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let payload: AuthSessionPayload = Self::auth_response(response).await?.json().await?;

        // The platform may defer to email confirmation, returning no token.
        let session = Self::session_from_payload(payload);
        if session.is_some() {
            self.set_current(session.clone());
        }
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .authed(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let payload: AuthSessionPayload = Self::auth_response(response).await?.json().await?;

        let session = Self::session_from_payload(payload)
            .ok_or_else(|| StorefrontError::Auth("로그인 응답에 세션이 없습니다.".to_string()))?;
        self.set_current(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let response = self
            .authed(self.http.post(self.auth_url("logout")))
            .send()
            .await?;
        Self::auth_response(response).await?;
        self.set_current(None);
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        Ok(self
            .current
            .read()
            .ok()
            .and_then(|current| current.clone()))
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}
