use crate::error::Result;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::{RwLock, watch};

/// Read-through cache keyed by query identity.
///
/// Reads hit the cache first and fall back to the supplied fetch; every
/// successful mutation invalidates its key synchronously and bumps a version
/// watched by subscribers, so consumers re-subscribe rather than poll.
/// There is no eviction beyond explicit invalidation.
pub struct QueryCache<T> {
    entries: RwLock<HashMap<String, T>>,
    version: watch::Sender<u64>,
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            entries: RwLock::new(HashMap::new()),
            version,
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(hit) = entries.get(key) {
                return Ok(hit.clone());
            }
        }

        let value = fetch().await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
        self.version.send_modify(|v| *v += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
