use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

/// Quantities at or below this (and above zero) are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Soft-delete marker shared by products, categories and brands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub stock_quantity: i32,
    pub stock_status: StockStatus,
    pub status: RecordStatus,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a shopper pays right now.
    pub fn effective_price(&self) -> &BigDecimal {
        self.sale_price.as_ref().unwrap_or(&self.base_price)
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Whether `quantity` units can be sold from current stock.
    pub fn can_fulfil(&self, quantity: i32) -> bool {
        self.stock_status != StockStatus::OutOfStock && self.stock_quantity >= quantity
    }

    pub fn set_stock(&mut self, quantity: i32) {
        self.stock_quantity = quantity;
        self.stock_status = StockStatus::from_quantity(quantity);
    }
}

/// The slice of a product embedded in carts, wishlists and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub image: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub stock_status: StockStatus,
    pub status: RecordStatus,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            sku: p.sku.clone(),
            image: p.images.first().cloned(),
            price: p.effective_price().clone(),
            stock_quantity: p.stock_quantity,
            stock_status: StockStatus::from_quantity(p.stock_quantity),
            status: p.status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub name_local: Option<String>,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub base_price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub stock_quantity: i32,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub name_local: Option<String>,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<BigDecimal>,
    /// `Some(None)` clears the sale price.
    pub sale_price: Option<Option<BigDecimal>>,
    /// Applied as an absolute stock adjustment, not by `apply`.
    pub stock_quantity: Option<i32>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: Option<bool>,
    pub status: Option<RecordStatus>,
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product) {
        if let Some(v) = self.name {
            product.name = v;
        }
        if let Some(v) = self.name_local {
            product.name_local = Some(v);
        }
        if let Some(v) = self.slug {
            product.slug = v;
        }
        if let Some(v) = self.sku {
            product.sku = v;
        }
        if let Some(v) = self.description {
            product.description = Some(v);
        }
        if let Some(v) = self.base_price {
            product.base_price = v;
        }
        if let Some(v) = self.sale_price {
            product.sale_price = v;
        }
        if let Some(v) = self.images {
            product.images = v;
        }
        if let Some(v) = self.category_id {
            product.category_id = Some(v);
        }
        if let Some(v) = self.brand_id {
            product.brand_id = Some(v);
        }
        if let Some(v) = self.is_featured {
            product.is_featured = v;
        }
        if let Some(v) = self.status {
            product.status = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub stock_status: Option<StockStatus>,
    pub featured: Option<bool>,
    pub include_inactive: bool,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Stable textual form used to key cached listings.
    pub fn cache_fragment(&self) -> String {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }
        format!(
            "c={}|b={}|q={}|min={}|max={}|s={}|f={}|all={}|sort={:?}",
            opt(&self.category_id),
            opt(&self.brand_id),
            self.search.as_deref().unwrap_or_default().to_lowercase(),
            opt(&self.min_price),
            opt(&self.max_price),
            opt(&self.stock_status),
            opt(&self.featured),
            self.include_inactive,
            self.sort,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    Set(i32),
    Add(i32),
    Subtract(i32),
}

impl StockAdjustment {
    pub fn validate(&self) -> Result<(), DomainError> {
        let n = match self {
            StockAdjustment::Set(n) | StockAdjustment::Add(n) | StockAdjustment::Subtract(n) => *n,
        };
        if n < 0 {
            return Err(DomainError::validation("Stock quantity cannot be negative"));
        }
        Ok(())
    }
}

pub fn validate_pricing(base: &BigDecimal, sale: Option<&BigDecimal>) -> Result<(), DomainError> {
    if base < &BigDecimal::zero() {
        return Err(DomainError::validation("Base price cannot be negative"));
    }
    if let Some(sale) = sale {
        if sale < &BigDecimal::zero() {
            return Err(DomainError::validation("Sale price cannot be negative"));
        }
        if sale > base {
            return Err(DomainError::validation(
                "Sale price cannot be greater than base price",
            ));
        }
    }
    Ok(())
}

/// Lower-case, ASCII-alphanumeric words joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::from_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_quantity(1), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(10), StockStatus::LowStock);
        assert_eq!(StockStatus::from_quantity(11), StockStatus::InStock);
        assert_eq!(StockStatus::from_quantity(-3), StockStatus::OutOfStock);
    }

    #[test]
    fn stock_status_round_trips_through_strings() {
        assert_eq!(StockStatus::LowStock.as_ref(), "low_stock");
        assert_eq!(
            StockStatus::from_str("out_of_stock").expect("parse"),
            StockStatus::OutOfStock
        );
    }

    #[test]
    fn sale_price_above_base_is_rejected() {
        assert!(validate_pricing(&dec("100"), Some(&dec("120"))).is_err());
        assert!(validate_pricing(&dec("100"), Some(&dec("100"))).is_ok());
        assert!(validate_pricing(&dec("100"), None).is_ok());
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Whey Protein -- 5lb (Chocolate)"), "whey-protein-5lb-chocolate");
        assert_eq!(slugify("Omega 3!"), "omega-3");
    }

    #[test]
    fn negative_adjustment_is_rejected() {
        assert!(StockAdjustment::Add(-1).validate().is_err());
        assert!(StockAdjustment::Set(0).validate().is_ok());
    }
}
