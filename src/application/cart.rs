use super::cache::QueryCache;
use crate::domain::cart::CartLine;
use crate::domain::ports::CartStoreBox;
use crate::error::Result;
use tokio::sync::watch;

const CART_QUERY: &str = "cart";

/// Cart operations behind the read-through query cache. Every successful
/// mutation invalidates the cart key synchronously, so the next read goes
/// back to the store.
pub struct CartService {
    store: CartStoreBox,
    cache: QueryCache<Vec<CartLine>>,
}

impl CartService {
    pub fn new(store: CartStoreBox) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
        }
    }

    /// Current cart lines, oldest first.
    pub async fn lines(&self) -> Result<Vec<CartLine>> {
        self.cache
            .get_or_fetch(CART_QUERY, || self.store.lines())
            .await
    }

    /// Adds a product to the cart. An existing entry for the product gets
    /// its quantity incremented; otherwise a new entry is inserted.
    pub async fn add(&self, product_id: &str, quantity: u32) -> Result<()> {
        let quantity = quantity.max(1);
        if let Some(existing) = self.store.find_by_product(product_id).await? {
            self.store
                .set_quantity(&existing.id, existing.quantity + quantity)
                .await?;
        } else {
            self.store.insert(product_id, quantity).await?;
        }
        self.cache.invalidate(CART_QUERY).await;
        Ok(())
    }

    /// Sets an entry's quantity. Zero or below deletes the entry instead of
    /// persisting it at zero.
    pub async fn set_quantity(&self, entry_id: &str, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            self.store.delete(entry_id).await?;
        } else {
            self.store.set_quantity(entry_id, quantity as u32).await?;
        }
        self.cache.invalidate(CART_QUERY).await;
        Ok(())
    }

    pub async fn remove(&self, entry_id: &str) -> Result<()> {
        self.store.delete(entry_id).await?;
        self.cache.invalidate(CART_QUERY).await;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        self.cache.invalidate(CART_QUERY).await;
        Ok(())
    }

    /// Change feed for consumers that re-render the cart.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }
}
