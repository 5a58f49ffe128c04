//! The two `CartStore` backends.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::cache::Cache;
use crate::domain::cart::{CartItem, CartOwner, SessionCart, SESSION_CART_TTL};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartItemRepository, CartStore};

/// Signed-in carts: one database row per line.
pub struct DurableCartStore {
    rows: Arc<dyn CartItemRepository>,
}

impl DurableCartStore {
    pub fn new(rows: Arc<dyn CartItemRepository>) -> Self {
        Self { rows }
    }
}

fn user_of(owner: &CartOwner) -> Result<Uuid, DomainError> {
    owner
        .user_id()
        .ok_or_else(|| DomainError::Internal("guest cart routed to the durable store".to_string()))
}

impl CartStore for DurableCartStore {
    fn items(&self, owner: &CartOwner) -> Result<Vec<CartItem>, DomainError> {
        self.rows.list(user_of(owner)?)
    }

    fn insert(&self, owner: &CartOwner, item: CartItem) -> Result<(), DomainError> {
        self.rows.insert(user_of(owner)?, &item)
    }

    fn set_quantity(&self, owner: &CartOwner, item_id: Uuid, quantity: i32) -> Result<bool, DomainError> {
        self.rows.set_quantity(user_of(owner)?, item_id, quantity)
    }

    fn remove(&self, owner: &CartOwner, item_id: Uuid) -> Result<bool, DomainError> {
        self.rows.delete(user_of(owner)?, item_id)
    }

    fn clear(&self, owner: &CartOwner) -> Result<(), DomainError> {
        self.rows.clear(user_of(owner)?)
    }
}

/// Guest carts: the whole cart is one cache entry, rewritten on every change.
/// Nothing survives eviction.
pub struct SessionCartStore {
    cache: Cache,
}

impl SessionCartStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    fn load(&self, owner: &CartOwner) -> Result<(String, SessionCart), DomainError> {
        let CartOwner::Session(sid) = owner else {
            return Err(DomainError::Internal(
                "user cart routed to the session store".to_string(),
            ));
        };
        let key = SessionCart::key(sid);
        let cart = self.cache.get_json::<SessionCart>(&key).unwrap_or_default();
        Ok((key, cart))
    }

    fn save(&self, key: &str, items: Vec<CartItem>) {
        if items.is_empty() {
            self.cache.invalidate(key);
        } else {
            self.cache
                .put_json(key, &SessionCart::from_items(items), Some(SESSION_CART_TTL));
        }
    }
}

impl CartStore for SessionCartStore {
    fn items(&self, owner: &CartOwner) -> Result<Vec<CartItem>, DomainError> {
        Ok(self.load(owner)?.1.items)
    }

    fn insert(&self, owner: &CartOwner, item: CartItem) -> Result<(), DomainError> {
        let (key, mut cart) = self.load(owner)?;
        cart.items.push(item);
        self.save(&key, cart.items);
        Ok(())
    }

    fn set_quantity(&self, owner: &CartOwner, item_id: Uuid, quantity: i32) -> Result<bool, DomainError> {
        let (key, mut cart) = self.load(owner)?;
        let Some(item) = cart.items.iter_mut().find(|i| i.id == item_id) else {
            return Ok(false);
        };
        item.quantity = quantity;
        self.save(&key, cart.items);
        Ok(true)
    }

    fn remove(&self, owner: &CartOwner, item_id: Uuid) -> Result<bool, DomainError> {
        let (key, mut cart) = self.load(owner)?;
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        if cart.items.len() == before {
            return Ok(false);
        }
        self.save(&key, cart.items);
        Ok(true)
    }

    fn clear(&self, owner: &CartOwner) -> Result<(), DomainError> {
        let (key, _) = self.load(owner)?;
        self.cache.invalidate(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CacheStore;
    use crate::infrastructure::cache::InMemoryCache;
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    fn line(price: i64) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            variant_id: None,
            quantity: 1,
            unit_price: BigDecimal::from(price),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn session_cart_blob_carries_totals() {
        let backend = Arc::new(InMemoryCache::new());
        let store = SessionCartStore::new(Cache::new(backend.clone()));
        let owner = CartOwner::Session("sess-1".into());
        let item = line(2500);
        store.insert(&owner, item.clone()).expect("insert");
        assert!(store.set_quantity(&owner, item.id, 2).expect("update"));

        let raw = backend
            .get("session_cart:sess-1")
            .expect("get")
            .expect("blob present");
        let blob: SessionCart = serde_json::from_str(&raw).expect("json");
        assert_eq!(blob.item_count, 2);
        assert_eq!(blob.subtotal, BigDecimal::from(5000));
    }

    #[test]
    fn evicted_session_cart_reads_empty() {
        let backend = Arc::new(InMemoryCache::new());
        let store = SessionCartStore::new(Cache::new(backend.clone()));
        let owner = CartOwner::Session("gone".into());
        store.insert(&owner, line(100)).expect("insert");
        backend.del("session_cart:gone").expect("evict");
        assert!(store.items(&owner).expect("items").is_empty());
    }

    #[test]
    fn removing_unknown_line_reports_false() {
        let store = SessionCartStore::new(Cache::new(Arc::new(InMemoryCache::new())));
        let owner = CartOwner::Session("s".into());
        assert!(!store.remove(&owner, Uuid::new_v4()).expect("remove"));
    }

    #[test]
    fn stores_reject_the_wrong_owner_kind() {
        let store = SessionCartStore::new(Cache::new(Arc::new(InMemoryCache::new())));
        assert!(store.items(&CartOwner::User(Uuid::new_v4())).is_err());
    }
}
