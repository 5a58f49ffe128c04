use std::collections::HashMap;
use std::time::Duration;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::{Product, ProductSummary};

pub const MAX_LINE_QUANTITY: i32 = 100;
pub const SESSION_CART_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const CART_VIEW_TTL: Duration = Duration::from_secs(5 * 60);

/// Who a cart belongs to: a signed-in user (durable rows) or a guest session (cache only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    User(Uuid),
    Session(String),
}

impl CartOwner {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            CartOwner::User(id) => Some(*id),
            CartOwner::Session(_) => None,
        }
    }

    /// Key of the computed cart view.
    pub fn view_key(&self) -> String {
        match self {
            CartOwner::User(id) => format!("cart:user:{id}"),
            CartOwner::Session(sid) => format!("cart:session:{sid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    /// Snapshot of the effective price when the item was first added.
    pub unit_price: BigDecimal,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(product: &Product, variant_id: Option<Uuid>, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product.id,
            variant_id,
            quantity,
            unit_price: product.effective_price().clone(),
            added_at: Utc::now(),
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }

    pub fn matches(&self, product_id: Uuid, variant_id: Option<Uuid>) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: BigDecimal,
    pub item_count: i32,
}

impl CartTotals {
    /// Subtotal is rounded to whole currency units.
    pub fn compute(items: &[CartItem]) -> Self {
        let subtotal = items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + item.line_total())
            .round(0);
        let item_count = items.iter().map(|i| i.quantity).sum();
        Self {
            subtotal,
            item_count,
        }
    }
}

/// The guest cart blob kept in the cache under `session_cart:{sid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCart {
    pub items: Vec<CartItem>,
    pub subtotal: BigDecimal,
    pub item_count: i32,
}

impl SessionCart {
    pub fn key(session_id: &str) -> String {
        format!("session_cart:{session_id}")
    }

    pub fn from_items(items: Vec<CartItem>) -> Self {
        let totals = CartTotals::compute(&items);
        Self {
            items,
            subtotal: totals.subtotal,
            item_count: totals.item_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub subtotal: BigDecimal,
    pub item_count: i32,
}

impl Cart {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: BigDecimal::zero(),
            item_count: 0,
        }
    }

    pub fn build(items: &[CartItem], products: &HashMap<Uuid, Product>) -> Self {
        let totals = CartTotals::compute(items);
        let lines = items
            .iter()
            .map(|item| CartLine {
                id: item.id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                line_total: item.line_total(),
                product: products.get(&item.product_id).map(ProductSummary::from),
            })
            .collect();
        Self {
            items: lines,
            subtotal: totals.subtotal,
            item_count: totals.item_count,
        }
    }
}

pub fn validate_line_quantity(quantity: i32) -> Result<(), DomainError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(DomainError::validation(format!(
            "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(price: &str, quantity: i32) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            variant_id: None,
            quantity,
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn totals_sum_lines_and_round() {
        let totals = CartTotals::compute(&[item("999.60", 1), item("500", 2)]);
        assert_eq!(totals.subtotal, BigDecimal::from(2000));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn empty_cart_totals() {
        let totals = CartTotals::compute(&[]);
        assert_eq!(totals.subtotal, BigDecimal::zero());
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(100).is_ok());
        assert!(validate_line_quantity(101).is_err());
    }

    #[test]
    fn owner_keys_do_not_collide() {
        let id = Uuid::new_v4();
        assert_ne!(
            CartOwner::User(id).view_key(),
            CartOwner::Session(id.to_string()).view_key()
        );
        assert_eq!(SessionCart::key("sess-1"), "session_cart:sess-1");
    }

    #[test]
    fn cart_without_product_rows_still_totals() {
        let cart = Cart::build(&[item("2500", 1)], &HashMap::new());
        assert_eq!(cart.subtotal, BigDecimal::from(2500));
        assert_eq!(cart.item_count, 1);
        assert!(cart.items[0].product.is_none());
    }
}
