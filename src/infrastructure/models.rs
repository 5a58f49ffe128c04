//! Row types and their mapping to domain types.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::cart::CartItem;
use crate::domain::catalog::{Brand, Category};
use crate::domain::errors::DomainError;
use crate::domain::order::{Address, Order, OrderItem};
use crate::domain::product::{Product, StockStatus};
use crate::domain::user::{ProfileChanges, User};
use crate::domain::wishlist::WishlistItem;
use crate::schema::{brands, cart_items, categories, order_items, orders, products, users, wishlist_items};

/// Parses a status-like text column into its enum.
pub fn parse_enum<T: FromStr>(column: &str, raw: &str) -> Result<T, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::Internal(format!("unexpected {column} value '{raw}'")))
}

fn parse_address(column: &str, raw: Value) -> Result<Address, DomainError> {
    serde_json::from_value(raw)
        .map_err(|e| DomainError::Internal(format!("malformed {column}: {e}")))
}

pub fn address_json(address: &Address) -> Result<Value, DomainError> {
    serde_json::to_value(address)
        .map_err(|e| DomainError::Internal(format!("address is not encodable: {e}")))
}

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub stock_quantity: i32,
    pub stock_status: String,
    pub status: String,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            name_local: row.name_local,
            slug: row.slug,
            sku: row.sku,
            description: row.description,
            base_price: row.base_price,
            sale_price: row.sale_price,
            // The stored column only serves filtering; reads re-derive it.
            stock_status: StockStatus::from_quantity(row.stock_quantity),
            stock_quantity: row.stock_quantity,
            status: parse_enum("product status", &row.status)?,
            images: row.images,
            category_id: row.category_id,
            brand_id: row.brand_id,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub stock_quantity: i32,
    pub stock_status: String,
    pub status: String,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: bool,
}

/// Descriptive-field update; `None` clears nullable columns. Stock columns
/// are left alone, they only move through conditional adjustments.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = products, treat_none_as_null = true)]
pub struct ProductChangeset<'a> {
    pub name: &'a str,
    pub name_local: Option<&'a str>,
    pub slug: &'a str,
    pub sku: &'a str,
    pub description: Option<&'a str>,
    pub base_price: &'a BigDecimal,
    pub sale_price: Option<&'a BigDecimal>,
    pub status: &'a str,
    pub images: &'a [String],
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Product> for ProductChangeset<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            name: &p.name,
            name_local: p.name_local.as_deref(),
            slug: &p.slug,
            sku: &p.sku,
            description: p.description.as_deref(),
            base_price: &p.base_price,
            sale_price: p.sale_price.as_ref(),
            status: p.status.as_ref(),
            images: &p.images,
            category_id: p.category_id,
            brand_id: p.brand_id,
            is_featured: p.is_featured,
            updated_at: p.updated_at,
        }
    }
}

// ── Categories & brands ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = DomainError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
            parent_id: row.parent_id,
            sort_order: row.sort_order,
            status: parse_enum("category status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = categories, treat_none_as_null = true)]
pub struct CategoryValues {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = brands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BrandRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BrandRow> for Brand {
    type Error = DomainError;

    fn try_from(row: BrandRow) -> Result<Self, Self::Error> {
        Ok(Brand {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            logo_url: row.logo_url,
            status: parse_enum("brand status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = brands, treat_none_as_null = true)]
pub struct BrandValues {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: String,
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            added_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub billing_address: Value,
    pub shipping_address: Value,
    pub subtotal: BigDecimal,
    pub shipping_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub payment_method: String,
    pub shipping_method: String,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            status: parse_enum("order status", &row.status)?,
            payment_status: parse_enum("payment status", &row.payment_status)?,
            billing_address: parse_address("billing_address", row.billing_address)?,
            shipping_address: parse_address("shipping_address", row.shipping_address)?,
            subtotal: row.subtotal,
            shipping_amount: row.shipping_amount,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
            total_amount: row.total_amount,
            payment_method: parse_enum("payment method", &row.payment_method)?,
            shipping_method: parse_enum("shipping method", &row.shipping_method)?,
            coupon_code: row.coupon_code,
            notes: row.notes,
            tracking_number: row.tracking_number,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub billing_address: Value,
    pub shipping_address: Value,
    pub subtotal: BigDecimal,
    pub shipping_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub payment_method: String,
    pub shipping_method: String,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Columns touched by a status change. `None` leaves a column as it is.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct StatusChangeset<'a> {
    pub status: &'a str,
    pub tracking_number: Option<&'a str>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub line_no: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_sku: row.product_sku,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    /// Position of the line within its order, from 1.
    pub line_no: i32,
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role: parse_enum("role", &row.role)?,
            status: parse_enum("user status", &row.status)?,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
}

/// Profile fields only; `None` leaves the column as it is.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct ProfileChangeset<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> ProfileChangeset<'a> {
    pub fn new(changes: &'a ProfileChanges, at: DateTime<Utc>) -> Self {
        Self {
            first_name: changes.first_name.as_deref(),
            last_name: changes.last_name.as_deref(),
            phone: changes.phone.as_deref(),
            updated_at: at,
        }
    }
}

// ── Wishlist ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = wishlist_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WishlistRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistItem {
    fn from(row: WishlistRow) -> Self {
        WishlistItem {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            created_at: row.created_at,
        }
    }
}

/// Converts loaded rows, failing on the first malformed one.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DomainError>
where
    T: TryFrom<R, Error = DomainError>,
{
    rows.into_iter().map(T::try_from).collect()
}
