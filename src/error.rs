use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorefrontError>;

#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Caught before any network call (non-positive amount, empty cart,
    /// missing credentials, bad quantity).
    #[error("{0}")]
    Validation(String),
    /// The payment return URL is missing its outcome tag or order id.
    #[error("유효하지 않은 결제 요청입니다.")]
    InvalidRedirect,
    #[error("주문을 찾을 수 없습니다: {0}")]
    OrderNotFound(String),
    /// A terminal order refused a conflicting status change.
    #[error("주문 상태를 {from}에서 {to}(으)로 변경할 수 없습니다")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    /// Data-store operation failure, carrying the provider's own message.
    #[error("store error: {0}")]
    Store(String),
    #[error("auth error: {0}")]
    Auth(String),
    /// The payment provider rejected or cancelled the checkout invocation.
    #[error("{0}")]
    Gateway(String),
    /// The chat completion endpoint returned a non-200 or error-shaped body.
    #[error("completion error: {0}")]
    Completion(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
