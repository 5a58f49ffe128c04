use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::errors::DomainError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn transition_to(self, target: OrderStatus) -> Result<OrderStatus, DomainError> {
        if self.allowed_transitions().contains(&target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    Card,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// Flat shipping fee in whole currency units.
    pub fn cost(&self) -> BigDecimal {
        match self {
            ShippingMethod::Express => BigDecimal::from(800),
            ShippingMethod::Standard => BigDecimal::from(400),
        }
    }
}

/// Address snapshot stored on the order as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Address {
    #[validate(length(min = 1, max = 150, message = "name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 255, message = "address line 1 is required"))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "state/province is required"))]
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[validate(length(min = 7, max = 30, message = "phone is required"))]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub subtotal: BigDecimal,
    pub shipping_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized order line; never rewritten after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl NewOrderItem {
    pub fn total_price(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Uuid,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: BigDecimal,
    pub shipping_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
}

impl OrderTotals {
    /// Totals are computed once at creation and never recomputed.
    /// Tax and discount are not modelled yet and stay at zero.
    pub fn compute(items: &[NewOrderItem], shipping: &ShippingMethod) -> Self {
        let subtotal = items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + item.total_price());
        let shipping_amount = shipping.cost();
        let tax_amount = BigDecimal::zero();
        let discount_amount = BigDecimal::zero();
        let total_amount = &subtotal + &shipping_amount + &tax_amount - &discount_amount;
        Self {
            subtotal,
            shipping_amount,
            tax_amount,
            discount_amount,
            total_amount,
        }
    }
}

/// Columns written when an order changes status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    pub fn plan(
        order: &Order,
        target: OrderStatus,
        tracking_number: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let to = order.status.transition_to(target)?;
        let mut change = StatusChange {
            from: order.status,
            to,
            tracking_number: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            at: now,
        };
        match to {
            OrderStatus::Shipped => {
                change.shipped_at = Some(now);
                change.tracking_number = tracking_number.filter(|t| !t.trim().is_empty());
            }
            OrderStatus::Delivered => change.delivered_at = Some(now),
            OrderStatus::Cancelled => change.cancelled_at = Some(now),
            _ => {}
        }
        Ok(change)
    }

    pub fn apply(&self, order: &mut Order) {
        order.status = self.to;
        if self.tracking_number.is_some() {
            order.tracking_number = self.tracking_number.clone();
        }
        if self.shipped_at.is_some() {
            order.shipped_at = self.shipped_at;
        }
        if self.delivered_at.is_some() {
            order.delivered_at = self.delivered_at;
        }
        if self.cancelled_at.is_some() {
            order.cancelled_at = self.cancelled_at;
        }
        order.updated_at = self.at;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
}

impl From<&Order> for OrderSummary {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number.clone(),
            status: o.status,
            payment_status: o.payment_status,
            total_amount: o.total_amount.clone(),
            payment_method: o.payment_method,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkUpdateResult {
    pub successful: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub message: String,
}

/// `ORD-YYYYMMDD-NNNNNN`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!("ORD-{}-{:06}", now.format("%Y%m%d"), suffix)
}
