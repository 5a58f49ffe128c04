use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{ProductRepository, WishlistRepository};
use crate::domain::product::{Product, ProductSummary};
use crate::domain::wishlist::{WishlistEntry, WishlistItem};

#[derive(Clone)]
pub struct WishlistService {
    wishlist: Arc<dyn WishlistRepository>,
    products: Arc<dyn ProductRepository>,
}

impl WishlistService {
    pub fn new(wishlist: Arc<dyn WishlistRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { wishlist, products }
    }

    pub fn list(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>, DomainError> {
        let items = self.wishlist.list(user_id)?;
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = self
            .products
            .find_many(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(items
            .into_iter()
            .map(|item| WishlistEntry {
                id: item.id,
                product_id: item.product_id,
                product: products.get(&item.product_id).map(ProductSummary::from),
                added_at: item.created_at,
            })
            .collect())
    }

    pub fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem, DomainError> {
        self.products
            .find_by_id(product_id)?
            .filter(Product::is_active)
            .ok_or_else(|| DomainError::not_found("Product"))?;
        if self.wishlist.contains(user_id, product_id)? {
            return Err(DomainError::Conflict(
                "Product is already in your wishlist".to_string(),
            ));
        }
        self.wishlist.add(user_id, product_id)
    }

    pub fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        if !self.wishlist.remove(user_id, product_id)? {
            return Err(DomainError::not_found("Wishlist item"));
        }
        Ok(())
    }

    pub fn contains(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        self.wishlist.contains(user_id, product_id)
    }
}
