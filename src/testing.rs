//! In-memory doubles of every port, shared by the unit and handler tests.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::tokens::{TokenService, DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
use crate::domain::analytics::{SaleRecord, SoldItem};
use crate::domain::cart::CartItem;
use crate::domain::catalog::{Brand, Category, NewBrand, NewCategory};
use crate::domain::errors::DomainError;
use crate::domain::notification::EmailMessage;
use crate::domain::order::{
    Address, NewOrder, Order, OrderDetails, OrderFilter, OrderItem, OrderStatus, OrderTotals,
    NewOrderItem, PaymentMethod, PaymentStatus, ShippingMethod, StatusChange,
};
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{
    AnalyticsRepository, BrandRepository, CartItemRepository, CategoryRepository, Mailer,
    ObjectStorage, OrderRepository, ProductRepository, UserRepository, WishlistRepository,
};
use crate::domain::product::{
    slugify, NewProduct, Product, ProductFilter, ProductSort, RecordStatus, StockAdjustment,
    StockStatus, LOW_STOCK_THRESHOLD,
};
use crate::domain::user::{
    normalize_email, NewUser, ProfileChanges, Role, User, UserFilter, UserStatus,
};
use crate::domain::wishlist::WishlistItem;

pub fn new_product(name: &str, sku: &str, price: i64, stock: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        name_local: None,
        slug: slugify(name),
        sku: sku.to_string(),
        description: None,
        base_price: BigDecimal::from(price),
        sale_price: None,
        stock_quantity: stock,
        images: Vec::new(),
        category_id: None,
        brand_id: None,
        is_featured: false,
    }
}

pub fn address() -> Address {
    Address {
        full_name: "Bilal Ahmed".to_string(),
        line1: "12 Mall Road".to_string(),
        line2: None,
        city: "Lahore".to_string(),
        state: "Punjab".to_string(),
        postal_code: Some("54000".to_string()),
        country: Some("PK".to_string()),
        phone: "03001234567".to_string(),
    }
}

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    brands: HashMap<Uuid, Brand>,
    cart_items: HashMap<Uuid, Vec<CartItem>>,
    orders: Vec<OrderDetails>,
    users: HashMap<Uuid, User>,
    wishlist: Vec<WishlistItem>,
}

/// Every repository over one locked state, so multi-step writes are atomic
/// the same way a database transaction is.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

fn paginate<T: Clone>(rows: &[T], page: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

fn take_stock(product: &mut Product, quantity: i32) -> Result<(), DomainError> {
    if product.stock_quantity < quantity {
        return Err(DomainError::InsufficientStock {
            product: product.name.clone(),
            requested: quantity,
            available: product.stock_quantity,
        });
    }
    product.set_stock(product.stock_quantity - quantity);
    product.updated_at = Utc::now();
    Ok(())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    fn with_user(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        change: impl FnOnce(&mut User),
    ) -> Result<User, DomainError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User"))?;
        change(user);
        user.updated_at = at;
        Ok(user.clone())
    }

    pub fn tokens(&self) -> TokenService {
        TokenService::new(
            "test-access-secret",
            "test-refresh-secret",
            DEFAULT_ACCESS_TTL_SECS,
            DEFAULT_REFRESH_TTL_SECS,
        )
    }

    pub fn put_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Inserts an active user without a usable password.
    pub fn add_user(&self, email: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
            role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.put_user(user.clone());
        user
    }

    pub fn insert_product(&self, product: NewProduct) -> Product {
        ProductRepository::create(self, product).expect("insert product")
    }

    pub fn replace_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    pub fn product(&self, id: Uuid) -> Product {
        self.lock()
            .products
            .get(&id)
            .cloned()
            .expect("product exists")
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Stores an order directly in `status` with standard shipping. Stock is untouched.
    pub fn seed_order(&self, user: &User, status: OrderStatus, lines: &[(&Product, i32)]) -> Order {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let new_items: Vec<NewOrderItem> = lines
            .iter()
            .map(|(product, quantity)| NewOrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                quantity: *quantity,
                unit_price: product.effective_price().clone(),
            })
            .collect();
        let totals = OrderTotals::compute(&new_items, &ShippingMethod::Standard);
        let order = Order {
            id,
            order_number: format!("ORD-{}-{:06}", now.format("%Y%m%d"), self.order_count() + 1),
            user_id: user.id,
            status,
            payment_status: PaymentStatus::Pending,
            billing_address: address(),
            shipping_address: address(),
            subtotal: totals.subtotal,
            shipping_amount: totals.shipping_amount,
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            total_amount: totals.total_amount,
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_method: ShippingMethod::Standard,
            coupon_code: None,
            notes: None,
            tracking_number: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        let items = order_items(id, &new_items);
        self.lock().orders.push(OrderDetails {
            order: order.clone(),
            items,
        });
        order
    }
}

fn order_items(order_id: Uuid, items: &[NewOrderItem]) -> Vec<OrderItem> {
    items
        .iter()
        .map(|item| OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_sku: item.product_sku.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
            total_price: item.total_price(),
        })
        .collect()
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if !filter.include_inactive && !product.is_active() {
        return false;
    }
    if filter.category_id.is_some() && product.category_id != filter.category_id {
        return false;
    }
    if filter.brand_id.is_some() && product.brand_id != filter.brand_id {
        return false;
    }
    if let Some(text) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let text = text.to_lowercase();
        if !product.name.to_lowercase().contains(&text)
            && !product.sku.to_lowercase().contains(&text)
        {
            return false;
        }
    }
    if filter.min_price.as_ref().is_some_and(|min| product.effective_price() < min) {
        return false;
    }
    if filter.max_price.as_ref().is_some_and(|max| product.effective_price() > max) {
        return false;
    }
    if filter.stock_status.is_some_and(|s| product.stock_status != s) {
        return false;
    }
    if filter.featured.is_some_and(|f| product.is_featured != f) {
        return false;
    }
    true
}

impl ProductRepository for MemoryStore {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            stock_status: StockStatus::from_quantity(product.stock_quantity),
            status: RecordStatus::Active,
            name: product.name,
            name_local: product.name_local,
            slug: product.slug,
            sku: product.sku,
            description: product.description,
            base_price: product.base_price,
            sale_price: product.sale_price,
            stock_quantity: product.stock_quantity,
            images: product.images,
            category_id: product.category_id,
            brand_id: product.brand_id,
            is_featured: product.is_featured,
            created_at: now,
            updated_at: now,
        };
        self.lock().products.insert(created.id, created.clone());
        Ok(created)
    }

    fn update(&self, product: &Product) -> Result<Product, DomainError> {
        let mut state = self.lock();
        let stored = state
            .products
            .get_mut(&product.id)
            .ok_or_else(|| DomainError::not_found("Product"))?;
        let (stock_quantity, stock_status) = (stored.stock_quantity, stored.stock_status);
        *stored = Product {
            stock_quantity,
            stock_status,
            ..product.clone()
        };
        Ok(stored.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError> {
        Ok(self
            .lock()
            .products
            .values()
            .find(|p| p.slug == slug && p.is_active())
            .cloned())
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), DomainError> {
        let state = self.lock();
        let mut rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let primary = match filter.sort {
                ProductSort::Newest => b.created_at.cmp(&a.created_at),
                ProductSort::PriceAsc => a.effective_price().cmp(b.effective_price()),
                ProductSort::PriceDesc => b.effective_price().cmp(a.effective_price()),
                ProductSort::Name => a.name.cmp(&b.name),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        Ok(self
            .lock()
            .products
            .values()
            .any(|p| p.sku == sku && p.is_active() && Some(p.id) != except))
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        Ok(self
            .lock()
            .products
            .values()
            .any(|p| p.slug == slug && p.is_active() && Some(p.id) != except))
    }

    fn adjust_stock(&self, id: Uuid, adjustment: StockAdjustment) -> Result<Product, DomainError> {
        let mut state = self.lock();
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Product"))?;
        match adjustment {
            StockAdjustment::Set(n) => product.set_stock(n),
            StockAdjustment::Add(n) => product.set_stock(product.stock_quantity + n),
            StockAdjustment::Subtract(n) => take_stock(product, n)?,
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    fn low_stock(&self, limit: i64) -> Result<Vec<Product>, DomainError> {
        let state = self.lock();
        let mut rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_active() && p.stock_quantity <= LOW_STOCK_THRESHOLD)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.stock_quantity
                .cmp(&b.stock_quantity)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn count_active(&self) -> Result<i64, DomainError> {
        Ok(self.lock().products.values().filter(|p| p.is_active()).count() as i64)
    }
}

impl CategoryRepository for MemoryStore {
    fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let now = Utc::now();
        let created = Category {
            id: Uuid::new_v4(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            image_url: category.image_url,
            parent_id: category.parent_id,
            sort_order: category.sort_order,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.lock().categories.insert(created.id, created.clone());
        Ok(created)
    }

    fn update(&self, category: &Category) -> Result<Category, DomainError> {
        let mut state = self.lock();
        let stored = state
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| DomainError::not_found("Category"))?;
        *stored = category.clone();
        Ok(stored.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.slug == slug && c.status == RecordStatus::Active)
            .cloned())
    }

    fn list_active(&self) -> Result<Vec<Category>, DomainError> {
        let mut rows: Vec<Category> = self
            .lock()
            .categories
            .values()
            .filter(|c| c.status == RecordStatus::Active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        Ok(self.lock().categories.values().any(|c| {
            c.slug == slug && c.status == RecordStatus::Active && Some(c.id) != except
        }))
    }
}

impl BrandRepository for MemoryStore {
    fn create(&self, brand: NewBrand) -> Result<Brand, DomainError> {
        let now = Utc::now();
        let created = Brand {
            id: Uuid::new_v4(),
            name: brand.name,
            slug: brand.slug,
            description: brand.description,
            logo_url: brand.logo_url,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.lock().brands.insert(created.id, created.clone());
        Ok(created)
    }

    fn update(&self, brand: &Brand) -> Result<Brand, DomainError> {
        let mut state = self.lock();
        let stored = state
            .brands
            .get_mut(&brand.id)
            .ok_or_else(|| DomainError::not_found("Brand"))?;
        *stored = brand.clone();
        Ok(stored.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Brand>, DomainError> {
        Ok(self.lock().brands.get(&id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, DomainError> {
        Ok(self
            .lock()
            .brands
            .values()
            .find(|b| b.slug == slug && b.status == RecordStatus::Active)
            .cloned())
    }

    fn list_active(&self) -> Result<Vec<Brand>, DomainError> {
        let mut rows: Vec<Brand> = self
            .lock()
            .brands
            .values()
            .filter(|b| b.status == RecordStatus::Active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        Ok(self.lock().brands.values().any(|b| {
            b.slug == slug && b.status == RecordStatus::Active && Some(b.id) != except
        }))
    }
}

impl CartItemRepository for MemoryStore {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        Ok(self
            .lock()
            .cart_items
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn insert(&self, user_id: Uuid, item: &CartItem) -> Result<(), DomainError> {
        self.lock()
            .cart_items
            .entry(user_id)
            .or_default()
            .push(item.clone());
        Ok(())
    }

    fn set_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let item = state
            .cart_items
            .get_mut(&user_id)
            .and_then(|items| items.iter_mut().find(|i| i.id == item_id));
        Ok(match item {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        })
    }

    fn delete(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let Some(items) = state.cart_items.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|i| i.id != item_id);
        Ok(items.len() < before)
    }

    fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.lock().cart_items.remove(&user_id);
        Ok(())
    }
}

fn write_status(details: &mut OrderDetails, change: &StatusChange) -> Result<Order, DomainError> {
    if details.order.status != change.from {
        return Err(DomainError::Conflict(
            "Order status was changed by another request".to_string(),
        ));
    }
    change.apply(&mut details.order);
    Ok(details.order.clone())
}

impl OrderRepository for MemoryStore {
    fn place_order(&self, order: NewOrder) -> Result<OrderDetails, DomainError> {
        let mut state = self.lock();
        if state
            .orders
            .iter()
            .any(|o| o.order.order_number == order.order_number)
        {
            return Err(DomainError::DuplicateOrderNumber(order.order_number));
        }

        // Work on copies so a failing line leaves every product untouched.
        let mut touched: HashMap<Uuid, Product> = HashMap::new();
        for item in &order.items {
            let product = match touched.entry(item.product_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(
                    state
                        .products
                        .get(&item.product_id)
                        .cloned()
                        .ok_or_else(|| DomainError::not_found("Product"))?,
                ),
            };
            take_stock(product, item.quantity)?;
        }
        state.products.extend(touched);

        let now = Utc::now();
        let id = Uuid::new_v4();
        let details = OrderDetails {
            order: Order {
                id,
                order_number: order.order_number,
                user_id: order.user_id,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Pending,
                billing_address: order.billing_address,
                shipping_address: order.shipping_address,
                subtotal: order.totals.subtotal,
                shipping_amount: order.totals.shipping_amount,
                tax_amount: order.totals.tax_amount,
                discount_amount: order.totals.discount_amount,
                total_amount: order.totals.total_amount,
                payment_method: order.payment_method,
                shipping_method: order.shipping_method,
                coupon_code: order.coupon_code,
                notes: order.notes,
                tracking_number: None,
                shipped_at: None,
                delivered_at: None,
                cancelled_at: None,
                created_at: now,
                updated_at: now,
            },
            items: order_items(id, &order.items),
        };
        state.cart_items.remove(&order.user_id);
        state.orders.push(details.clone());
        Ok(details)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetails>, DomainError> {
        Ok(self.lock().orders.iter().find(|o| o.order.id == id).cloned())
    }

    fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<(Vec<Order>, i64), DomainError> {
        let state = self.lock();
        let mut rows: Vec<Order> = state
            .orders
            .iter()
            .rev()
            .map(|d| &d.order)
            .filter(|o| filter.user_id.is_none_or(|id| o.user_id == id))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.payment_status.is_none_or(|s| o.payment_status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError> {
        let mut state = self.lock();
        let details = state
            .orders
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or_else(|| DomainError::not_found("Order"))?;
        write_status(details, change)
    }

    fn cancel_and_restock(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError> {
        let mut state = self.lock();
        let details = state
            .orders
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or_else(|| DomainError::not_found("Order"))?;
        let order = write_status(details, change)?;
        let lines: Vec<(Uuid, i32)> = details
            .items
            .iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();
        for (product_id, quantity) in lines {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.set_stock(product.stock_quantity + quantity);
            }
        }
        Ok(order)
    }

    fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<Order, DomainError> {
        let mut state = self.lock();
        let details = state
            .orders
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or_else(|| DomainError::not_found("Order"))?;
        details.order.payment_status = status;
        details.order.updated_at = Utc::now();
        Ok(details.order.clone())
    }
}

impl UserRepository for MemoryStore {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock();
        let email = normalize_email(&user.email);
        if state.users.values().any(|u| u.email == email) {
            return Err(DomainError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = normalize_email(email);
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<(Vec<User>, i64), DomainError> {
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let state = self.lock();
        let mut rows: Vec<User> = state
            .users
            .values()
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| filter.status.is_none_or(|s| u.status == s))
            .filter(|u| {
                search.as_deref().is_none_or(|text| {
                    u.email.contains(text)
                        || u.first_name.to_lowercase().contains(text)
                        || u.last_name.to_lowercase().contains(text)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok((paginate(&rows, page), rows.len() as i64))
    }

    fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
        at: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        self.with_user(id, at, |user| changes.apply(user))
    }

    fn set_role(&self, id: Uuid, role: Role, at: DateTime<Utc>) -> Result<User, DomainError> {
        self.with_user(id, at, |user| user.role = role)
    }

    fn set_status(&self, id: Uuid, status: UserStatus, at: DateTime<Utc>) -> Result<User, DomainError> {
        self.with_user(id, at, |user| user.status = status)
    }

    fn set_password_hash(&self, id: Uuid, hash: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.with_user(id, at, |user| user.password_hash = hash.to_string())?;
        Ok(())
    }

    fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

impl WishlistRepository for MemoryStore {
    fn list(&self, user_id: Uuid) -> Result<Vec<WishlistItem>, DomainError> {
        let mut rows: Vec<WishlistItem> = self
            .lock()
            .wishlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    fn contains(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        Ok(self
            .lock()
            .wishlist
            .iter()
            .any(|w| w.user_id == user_id && w.product_id == product_id))
    }

    fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem, DomainError> {
        let mut state = self.lock();
        if state
            .wishlist
            .iter()
            .any(|w| w.user_id == user_id && w.product_id == product_id)
        {
            return Err(DomainError::Conflict(
                "Product is already in your wishlist".to_string(),
            ));
        }
        let item = WishlistItem {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            created_at: Utc::now(),
        };
        state.wishlist.push(item.clone());
        Ok(item)
    }

    fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let before = state.wishlist.len();
        state
            .wishlist
            .retain(|w| !(w.user_id == user_id && w.product_id == product_id));
        Ok(state.wishlist.len() < before)
    }
}

impl AnalyticsRepository for MemoryStore {
    fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, DomainError> {
        let mut counts: HashMap<OrderStatus, i64> = HashMap::new();
        for details in &self.lock().orders {
            *counts.entry(details.order.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    fn revenue(&self) -> Result<BigDecimal, DomainError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|d| d.order.status != OrderStatus::Cancelled)
            .fold(BigDecimal::zero(), |acc, d| acc + &d.order.total_amount))
    }

    fn count_users(&self, role: Role) -> Result<i64, DomainError> {
        Ok(self.lock().users.values().filter(|u| u.role == role).count() as i64)
    }

    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SaleRecord>, DomainError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .map(|d| &d.order)
            .filter(|o| o.created_at >= since && o.status != OrderStatus::Cancelled)
            .map(|o| SaleRecord {
                created_at: o.created_at,
                total_amount: o.total_amount.clone(),
            })
            .collect())
    }

    fn items_sold_since(&self, since: DateTime<Utc>) -> Result<Vec<SoldItem>, DomainError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|d| d.order.created_at >= since && d.order.status != OrderStatus::Cancelled)
            .flat_map(|d| d.items.iter())
            .map(|i| SoldItem {
                product_id: i.product_id,
                product_name: i.product_name.clone(),
                quantity: i.quantity,
                total_price: i.total_price.clone(),
            })
            .collect())
    }
}

/// Records uploads instead of sending them anywhere.
#[derive(Default)]
pub struct MemoryObjectStorage {
    uploads: Mutex<Vec<String>>,
}

impl MemoryObjectStorage {
    pub fn paths(&self) -> Vec<String> {
        self.uploads.lock().expect("uploads poisoned").clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        path: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        self.uploads
            .lock()
            .expect("uploads poisoned")
            .push(path.to_string());
        Ok(format!("https://files.example.test/{path}"))
    }
}

/// Remembers recipients of delivered mail; sends to `failing` always error.
#[derive(Default)]
pub struct RecordingMailer {
    failing: Option<String>,
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn failing_for(address: &str) -> Self {
        Self {
            failing: Some(address.to_string()),
            sent: Mutex::default(),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("mailer poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        if self.failing.as_deref() == Some(message.to.as_str()) {
            return Err(DomainError::Internal("mailbox unavailable".to_string()));
        }
        self.sent
            .lock()
            .expect("mailer poisoned")
            .push(message.to.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
