use crate::domain::auth::Session;
use crate::domain::ports::AuthBackendBox;
use crate::error::Result;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, watch};

/// Process-wide auth state, constructed once and passed to dependents.
///
/// `init` loads the current session and opens the backend's change
/// subscription; `teardown` releases it. The loading flag is set until
/// `init` has resolved, mirroring the start-up window in which the session
/// is not yet known.
pub struct AuthContext {
    backend: AuthBackendBox,
    session: RwLock<Option<Session>>,
    loading: AtomicBool,
    subscription: Mutex<Option<watch::Receiver<Option<Session>>>>,
}

impl AuthContext {
    pub fn new(backend: AuthBackendBox) -> Self {
        Self {
            backend,
            session: RwLock::new(None),
            loading: AtomicBool::new(true),
            subscription: Mutex::new(None),
        }
    }

    /// Loads the persisted session and starts listening for auth changes.
    pub async fn init(&self) -> Result<()> {
        let current = self.backend.session().await?;
        *self.session.write().await = current;
        if let Ok(mut slot) = self.subscription.lock() {
            *slot = Some(self.backend.subscribe());
        }
        self.loading.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Drops the change subscription. Called once on shutdown.
    pub fn teardown(&self) {
        if let Ok(mut slot) = self.subscription.lock() {
            slot.take();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn session(&self) -> Option<Session> {
        self.absorb_changes().await;
        self.session.read().await.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.backend.sign_in(email, password).await?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let session = self.backend.sign_up(email, password).await?;
        if session.is_some() {
            *self.session.write().await = session.clone();
        }
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.backend.sign_out().await?;
        *self.session.write().await = None;
        Ok(())
    }

    // Folds any backend-pushed change (token refresh, sign-out elsewhere)
    // into the held session.
    async fn absorb_changes(&self) {
        let latest = match self.subscription.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(receiver) if receiver.has_changed().unwrap_or(false) => {
                    Some(receiver.borrow_and_update().clone())
                }
                _ => None,
            },
            Err(_) => None,
        };
        if let Some(latest) = latest {
            *self.session.write().await = latest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::AuthBackend;
    use crate::infrastructure::in_memory::InMemoryAuthBackend;

    #[tokio::test]
    async fn test_sign_in_populates_the_session() {
        let backend = InMemoryAuthBackend::new();
        backend.sign_up("a@b.co", "secret").await.unwrap();
        backend.sign_out().await.unwrap();

        let auth = AuthContext::new(Box::new(backend));
        auth.init().await.unwrap();
        assert!(!auth.is_loading());
        assert!(auth.session().await.is_none());

        auth.sign_in("a@b.co", "secret").await.unwrap();
        let session = auth.session().await.unwrap();
        assert_eq!(session.user.email, "a@b.co");

        auth.sign_out().await.unwrap();
        assert!(auth.session().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_is_an_auth_error() {
        let backend = InMemoryAuthBackend::new();
        backend.sign_up("a@b.co", "secret").await.unwrap();

        let auth = AuthContext::new(Box::new(backend));
        auth.init().await.unwrap();
        assert!(auth.sign_in("a@b.co", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_backend_pushed_change_is_absorbed() {
        let backend = InMemoryAuthBackend::new();
        let direct = backend.clone();

        let auth = AuthContext::new(Box::new(backend));
        auth.init().await.unwrap();

        // Someone signs in through the backend directly.
        direct.sign_up("a@b.co", "secret").await.unwrap();
        let session = auth.session().await.unwrap();
        assert_eq!(session.user.email, "a@b.co");
    }

    #[tokio::test]
    async fn test_teardown_releases_the_subscription() {
        let backend = InMemoryAuthBackend::new();
        let direct = backend.clone();

        let auth = AuthContext::new(Box::new(backend));
        auth.init().await.unwrap();
        assert_eq!(direct.subscriber_count(), 1);

        auth.teardown();
        assert_eq!(direct.subscriber_count(), 0);
    }
}
