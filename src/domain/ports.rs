use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::analytics::{SaleRecord, SoldItem};
use super::cart::{CartItem, CartOwner};
use super::catalog::{Brand, Category, NewBrand, NewCategory};
use super::errors::DomainError;
use super::notification::EmailMessage;
use super::order::{
    Order, OrderDetails, OrderFilter, OrderStatus, NewOrder, PaymentStatus, StatusChange,
};
use super::pagination::PageRequest;
use super::product::{NewProduct, Product, ProductFilter, StockAdjustment};
use super::user::{NewUser, ProfileChanges, Role, User, UserFilter, UserStatus};
use super::wishlist::WishlistItem;

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn update(&self, product: &Product) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError>;
    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), DomainError>;
    /// Uniqueness checks only consider active products.
    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> Result<bool, DomainError>;
    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError>;
    /// Applied in a single statement; `Subtract` only succeeds when enough stock remains.
    fn adjust_stock(&self, id: Uuid, adjustment: StockAdjustment) -> Result<Product, DomainError>;
    fn low_stock(&self, limit: i64) -> Result<Vec<Product>, DomainError>;
    fn count_active(&self) -> Result<i64, DomainError>;
}

pub trait CategoryRepository: Send + Sync + 'static {
    fn create(&self, category: NewCategory) -> Result<Category, DomainError>;
    fn update(&self, category: &Category) -> Result<Category, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError>;
    fn list_active(&self) -> Result<Vec<Category>, DomainError>;
    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError>;
}

pub trait BrandRepository: Send + Sync + 'static {
    fn create(&self, brand: NewBrand) -> Result<Brand, DomainError>;
    fn update(&self, brand: &Brand) -> Result<Brand, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Brand>, DomainError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, DomainError>;
    fn list_active(&self) -> Result<Vec<Brand>, DomainError>;
    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError>;
}

/// Durable cart rows of signed-in users.
pub trait CartItemRepository: Send + Sync + 'static {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError>;
    fn insert(&self, user_id: Uuid, item: &CartItem) -> Result<(), DomainError>;
    fn set_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32)
        -> Result<bool, DomainError>;
    fn delete(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DomainError>;
    fn clear(&self, user_id: Uuid) -> Result<(), DomainError>;
}

/// One cart interface over both storage modes; see `CartOwner`.
pub trait CartStore: Send + Sync + 'static {
    fn items(&self, owner: &CartOwner) -> Result<Vec<CartItem>, DomainError>;
    fn insert(&self, owner: &CartOwner, item: CartItem) -> Result<(), DomainError>;
    /// Returns `false` when the item does not exist for this owner.
    fn set_quantity(
        &self,
        owner: &CartOwner,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError>;
    fn remove(&self, owner: &CartOwner, item_id: Uuid) -> Result<bool, DomainError>;
    fn clear(&self, owner: &CartOwner) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order and its items, decrements stock conditionally and
    /// empties the owner's cart, all in one transaction.
    fn place_order(&self, order: NewOrder) -> Result<OrderDetails, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetails>, DomainError>;
    fn list(&self, filter: &OrderFilter, page: PageRequest)
        -> Result<(Vec<Order>, i64), DomainError>;
    fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError>;
    /// Cancels and puts every line's quantity back on the shelf in one transaction.
    fn cancel_and_restock(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError>;
    fn update_payment_status(&self, id: Uuid, status: PaymentStatus)
        -> Result<Order, DomainError>;
}

/// Updates touch only their own columns, so concurrent edits of different
/// fields do not undo each other.
pub trait UserRepository: Send + Sync + 'static {
    fn create(&self, user: NewUser) -> Result<User, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, i64), DomainError>;
    /// Writes only the fields that are set.
    fn update_profile(&self, id: Uuid, changes: &ProfileChanges, at: DateTime<Utc>)
        -> Result<User, DomainError>;
    fn set_role(&self, id: Uuid, role: Role, at: DateTime<Utc>) -> Result<User, DomainError>;
    fn set_status(&self, id: Uuid, status: UserStatus, at: DateTime<Utc>)
        -> Result<User, DomainError>;
    fn set_password_hash(&self, id: Uuid, hash: &str, at: DateTime<Utc>) -> Result<(), DomainError>;
    fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
}

pub trait WishlistRepository: Send + Sync + 'static {
    fn list(&self, user_id: Uuid) -> Result<Vec<WishlistItem>, DomainError>;
    fn contains(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError>;
    fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem, DomainError>;
    fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError>;
}

pub trait AnalyticsRepository: Send + Sync + 'static {
    fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, DomainError>;
    /// Sum of `total_amount` over orders that were not cancelled.
    fn revenue(&self) -> Result<BigDecimal, DomainError>;
    fn count_users(&self, role: Role) -> Result<i64, DomainError>;
    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SaleRecord>, DomainError>;
    fn items_sold_since(&self, since: DateTime<Utc>) -> Result<Vec<SoldItem>, DomainError>;
}

/// Best-effort key/value cache. Never a source of truth.
pub trait CacheStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError>;
    fn del(&self, key: &str) -> Result<(), DomainError>;
    fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get(key)?.is_some())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    /// Stores `bytes` at `path` and returns its public URL.
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError>;
}
