use crate::domain::order::CheckoutRequest;
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, StorefrontError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// Client for the provider's redirect-based card checkout.
///
/// The HTTP client is created lazily, keyed by the publishable client
/// credential; a missing credential is reported before any request goes out.
/// A successful invocation means control has been handed to the provider's
/// hosted checkout; the outcome only comes back later through the return
/// URL. Rejection covers the cancellation/failure path.
pub struct RedirectCheckoutGateway {
    client_key: String,
    api_base: String,
    http: OnceLock<reqwest::Client>,
}

impl RedirectCheckoutGateway {
    pub fn new(client_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            api_base: api_base.into(),
            http: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&reqwest::Client> {
        if self.client_key.trim().is_empty() {
            return Err(StorefrontError::Gateway(
                "결제 클라이언트 키가 설정되지 않았습니다.".to_string(),
            ));
        }
        Ok(self.http.get_or_init(reqwest::Client::new))
    }
}

#[async_trait]
impl PaymentGateway for RedirectCheckoutGateway {
    async fn request_card_checkout(&self, request: &CheckoutRequest) -> Result<()> {
        let http = self.client()?;
        let body = json!({
            "method": "CARD",
            "amount": request.amount,
            "orderId": request.order_id,
            "orderName": request.order_name,
            "customerName": request.customer_name,
            "successUrl": request.success_url,
            "failUrl": request.fail_url,
        });

        let response = http
            .post(format!("{}/v1/payments", self.api_base))
            .basic_auth(&self.client_key, Some(""))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        // Surface the provider's own message text.
        let fallback = response.status().to_string();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(if text.is_empty() { fallback } else { text });
        Err(StorefrontError::Gateway(message))
    }
}

/// Scripted gateway for offline runs and tests: either "redirects" (accepts
/// the invocation) or cancels with a fixed message, recording every request
/// it saw.
#[derive(Clone)]
pub struct StaticGateway {
    cancel_message: Option<String>,
    requests: Arc<RwLock<Vec<CheckoutRequest>>>,
}

impl StaticGateway {
    pub fn redirecting() -> Self {
        Self {
            cancel_message: None,
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn cancelling(message: impl Into<String>) -> Self {
        Self {
            cancel_message: Some(message.into()),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn requests_handle(&self) -> Arc<RwLock<Vec<CheckoutRequest>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn request_card_checkout(&self, request: &CheckoutRequest) -> Result<()> {
        self.requests.write().await.push(request.clone());
        match &self.cancel_message {
            Some(message) => Err(StorefrontError::Gateway(message.clone())),
            None => Ok(()),
        }
    }
}
