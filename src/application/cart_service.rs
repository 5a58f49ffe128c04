use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::cache::Cache;
use crate::domain::cart::{validate_line_quantity, Cart, CartItem, CartOwner, CART_VIEW_TTL, MAX_LINE_QUANTITY};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartStore, ProductRepository};
use crate::domain::product::Product;

/// Cart operations over both storage modes. The owner picks the store:
/// signed-in users get durable rows, guests a cached session blob.
#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductRepository>,
    durable: Arc<dyn CartStore>,
    session: Arc<dyn CartStore>,
    cache: Cache,
}

impl CartService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        durable: Arc<dyn CartStore>,
        session: Arc<dyn CartStore>,
        cache: Cache,
    ) -> Self {
        Self {
            products,
            durable,
            session,
            cache,
        }
    }

    fn store(&self, owner: &CartOwner) -> &dyn CartStore {
        match owner {
            CartOwner::User(_) => self.durable.as_ref(),
            CartOwner::Session(_) => self.session.as_ref(),
        }
    }

    /// Raw cart lines, uncached.
    pub fn items(&self, owner: &CartOwner) -> Result<Vec<CartItem>, DomainError> {
        self.store(owner).items(owner)
    }

    pub fn invalidate(&self, owner: &CartOwner) {
        self.cache.invalidate(&owner.view_key());
    }

    pub fn get_cart(&self, owner: Option<&CartOwner>) -> Result<Cart, DomainError> {
        let Some(owner) = owner else {
            return Ok(Cart::empty());
        };
        let key = owner.view_key();
        if let Some(cart) = self.cache.get_json::<Cart>(&key) {
            return Ok(cart);
        }

        let items = self.items(owner)?;
        if items.is_empty() {
            return Ok(Cart::empty());
        }
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = self
            .products
            .find_many(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let cart = Cart::build(&items, &products);
        self.cache.put_json(&key, &cart, Some(CART_VIEW_TTL));
        Ok(cart)
    }

    pub fn add_item(
        &self,
        owner: &CartOwner,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Cart, DomainError> {
        validate_line_quantity(quantity)?;
        let product = self.active_product(product_id)?;
        let store = self.store(owner);

        let existing = store
            .items(owner)?
            .into_iter()
            .find(|item| item.matches(product_id, variant_id));
        match existing {
            Some(item) => {
                let merged = item.quantity + quantity;
                if merged > MAX_LINE_QUANTITY {
                    return Err(DomainError::validation(format!(
                        "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
                    )));
                }
                ensure_stock(&product, merged)?;
                store.set_quantity(owner, item.id, merged)?;
            }
            None => {
                ensure_stock(&product, quantity)?;
                store.insert(owner, CartItem::new(&product, variant_id, quantity))?;
            }
        }

        self.invalidate(owner);
        self.get_cart(Some(owner))
    }

    /// A quantity of zero removes the line.
    pub fn update_item(&self, owner: &CartOwner, item_id: Uuid, quantity: i32) -> Result<Cart, DomainError> {
        if quantity == 0 {
            return self.remove_item(owner, item_id);
        }
        validate_line_quantity(quantity)?;
        let store = self.store(owner);
        let item = store
            .items(owner)?
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found("Cart item"))?;
        let product = self.active_product(item.product_id)?;
        ensure_stock(&product, quantity)?;

        if !store.set_quantity(owner, item_id, quantity)? {
            return Err(DomainError::not_found("Cart item"));
        }
        self.invalidate(owner);
        self.get_cart(Some(owner))
    }

    pub fn remove_item(&self, owner: &CartOwner, item_id: Uuid) -> Result<Cart, DomainError> {
        if !self.store(owner).remove(owner, item_id)? {
            return Err(DomainError::not_found("Cart item"));
        }
        self.invalidate(owner);
        self.get_cart(Some(owner))
    }

    pub fn clear(&self, owner: &CartOwner) -> Result<(), DomainError> {
        self.store(owner).clear(owner)?;
        self.invalidate(owner);
        Ok(())
    }

    /// Folds a guest cart into a user's durable cart after sign-in. Lines that
    /// no longer fit are capped to available stock or dropped, never fatal.
    pub fn merge_session_into_user(&self, session_id: &str, user_id: Uuid) -> Result<(), DomainError> {
        let guest = CartOwner::Session(session_id.to_string());
        let user = CartOwner::User(user_id);
        let items = self.session.items(&guest)?;
        if items.is_empty() {
            return Ok(());
        }

        let current = self.durable.items(&user)?;
        for item in items {
            let already = current
                .iter()
                .find(|c| c.matches(item.product_id, item.variant_id))
                .map_or(0, |c| c.quantity);
            let available = match self.products.find_by_id(item.product_id)? {
                Some(p) if p.is_active() => p.stock_quantity,
                _ => 0,
            };
            let quantity = item
                .quantity
                .min(available - already)
                .min(MAX_LINE_QUANTITY - already);
            if quantity <= 0 {
                log::info!(
                    "dropping guest cart line for product {} while merging into {user_id}",
                    item.product_id
                );
                continue;
            }
            if let Err(e) = self.add_item(&user, item.product_id, item.variant_id, quantity) {
                log::warn!(
                    "could not merge guest cart line for product {}: {e}",
                    item.product_id
                );
            }
        }

        self.session.clear(&guest)?;
        self.invalidate(&guest);
        self.invalidate(&user);
        Ok(())
    }

    fn active_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .filter(Product::is_active)
            .ok_or_else(|| DomainError::not_found("Product"))
    }
}

fn ensure_stock(product: &Product, quantity: i32) -> Result<(), DomainError> {
    if product.can_fulfil(quantity) {
        Ok(())
    } else {
        Err(DomainError::InsufficientStock {
            product: product.name.clone(),
            requested: quantity,
            available: product.stock_quantity.max(0),
        })
    }
}
