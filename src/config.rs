use std::env;
use std::path::PathBuf;

/// Publishable test credential used when no key is configured.
pub const DEFAULT_PAYMENT_CLIENT_KEY: &str = "test_ck_KNbdOvk5rkWX19R4L5Knrn07xlzm";
pub const DEFAULT_GATEWAY_API: &str = "https://api.tosspayments.com";
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Runtime configuration drawn from the environment.
///
/// The hosted-platform settings (`backend_url`, `anon_key`) are optional:
/// without them the CLI runs against the in-memory adapters only.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted data/auth platform.
    pub backend_url: Option<String>,
    /// Publishable key sent with every platform request.
    pub anon_key: Option<String>,
    /// Publishable client key for the payment provider.
    pub payment_client_key: String,
    /// Payment provider API base.
    pub gateway_api: String,
    /// Chat completion endpoint (the storefront support function).
    pub chat_endpoint: Option<String>,
    /// Origin the success/fail return URLs are rooted at.
    pub origin: String,
    /// File holding the persistent chat session identifier.
    pub session_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend_url: env::var("STOREFRONT_BACKEND_URL").ok(),
            anon_key: env::var("STOREFRONT_ANON_KEY").ok(),
            payment_client_key: env::var("PAYMENT_CLIENT_KEY")
                .unwrap_or_else(|_| DEFAULT_PAYMENT_CLIENT_KEY.to_string()),
            gateway_api: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_API.to_string()),
            chat_endpoint: env::var("CHAT_ENDPOINT").ok(),
            origin: env::var("STOREFRONT_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
            session_file: env::var("STOREFRONT_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".storefront/chat-session")),
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}/payment/success", self.origin)
    }

    pub fn fail_url(&self) -> String {
        format!("{}/payment/fail", self.origin)
    }
}
