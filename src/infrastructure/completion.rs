use crate::domain::ports::SupportCompletion;
use crate::error::{Result, StorefrontError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Deserialize)]
struct CompletionResponse {
    reply: Option<String>,
    error: Option<String>,
}

/// HTTP client for the storefront support completion endpoint.
///
/// Wire contract: outbound `{"message": ...}`, inbound `{"reply": ...}` or
/// `{"error": ...}`. A non-200 status or an error-shaped body is a failure,
/// never assistant text.
pub struct HttpCompletion {
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpCompletion {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SupportCompletion for HttpCompletion {
    async fn reply(&self, message: &str) -> Result<String> {
        let mut request = self.http.post(&self.endpoint).json(&json!({ "message": message }));
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Completion(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }

        let payload: CompletionResponse = response.json().await?;
        if let Some(error) = payload.error {
            return Err(StorefrontError::Completion(error));
        }
        Ok(payload.reply.unwrap_or_default())
    }
}

/// Scripted completion for offline runs and tests: a fixed reply, or a fixed
/// failure when none is configured. Counts how often it was consulted.
#[derive(Clone)]
pub struct CannedCompletion {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl CannedCompletion {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls_handle(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SupportCompletion for CannedCompletion {
    async fn reply(&self, _message: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(StorefrontError::Completion(
                "챗봇 엔드포인트가 설정되지 않았습니다.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_completion_counts_calls() {
        let completion = CannedCompletion::with_reply("안녕하세요!");
        let calls = completion.calls_handle();

        assert_eq!(completion.reply("hi").await.unwrap(), "안녕하세요!");
        assert_eq!(completion.reply("hi again").await.unwrap(), "안녕하세요!");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_completion_fails() {
        let completion = CannedCompletion::unavailable();
        assert!(matches!(
            completion.reply("hi").await,
            Err(StorefrontError::Completion(_))
        ));
    }
}
