use crate::domain::chat::{ChatMessage, SessionId};
use crate::domain::ports::{
    ChatMessageStoreBox, ProductStoreBox, SessionVault, SupportCompletionBox,
};
use crate::error::{Result, StorefrontError};

/// Trigger phrase that short-circuits the relay to a local catalog listing.
pub const PRODUCT_LIST_TRIGGER: &str = "테스트";

const EMPTY_CATALOG_REPLY: &str = "등록된 상품이 없습니다.";
const FALLBACK_REPLY: &str = "죄송합니다. 답변을 생성하지 못했어요.";

/// Forwards user input either to the local catalog listing (trigger phrase)
/// or to the support completion endpoint, appending every turn to the
/// message log in arrival order.
pub struct ChatRelay {
    products: ProductStoreBox,
    log: ChatMessageStoreBox,
    completion: SupportCompletionBox,
    session_id: SessionId,
}

impl ChatRelay {
    pub fn new(
        products: ProductStoreBox,
        log: ChatMessageStoreBox,
        completion: SupportCompletionBox,
        session_id: SessionId,
    ) -> Self {
        Self {
            products,
            log,
            completion,
            session_id,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Sends one user message and returns the assistant reply.
    pub async fn send(&self, input: &str) -> Result<String> {
        let text = input.trim();
        if text.is_empty() {
            return Err(StorefrontError::Validation(
                "메시지를 입력해 주세요.".to_string(),
            ));
        }

        self.append(ChatMessage::user(self.session_id.clone(), text))
            .await;

        let reply = if text == PRODUCT_LIST_TRIGGER {
            self.catalog_rundown().await?
        } else {
            match self.completion.reply(text).await? {
                reply if reply.trim().is_empty() => FALLBACK_REPLY.to_string(),
                reply => reply.trim().to_string(),
            }
        };

        self.append(ChatMessage::assistant(self.session_id.clone(), &reply))
            .await;
        Ok(reply)
    }

    async fn catalog_rundown(&self) -> Result<String> {
        let products = self.products.all().await?;
        if products.is_empty() {
            return Ok(EMPTY_CATALOG_REPLY.to_string());
        }

        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        Ok(format!("현재 판매 중인 상품: {}", names.join(", ")))
    }

    // Persisting a turn must not break the conversation; a failed append is
    // only visible on the diagnostic channel.
    async fn append(&self, message: ChatMessage) {
        if let Err(error) = self.log.append(message).await {
            tracing::warn!(session_id = %self.session_id, error = %error, "chat turn not persisted");
        }
    }
}

/// Loads the stable chat session id from the vault, generating and storing
/// one on first use.
pub fn persistent_session(vault: &dyn SessionVault) -> Result<SessionId> {
    if let Some(existing) = vault.load()? {
        return Ok(existing);
    }
    let fresh = SessionId::generate();
    vault.store(&fresh)?;
    Ok(fresh)
}
