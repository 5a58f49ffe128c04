use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::cart_service::CartService;
use super::notifier::Notifier;
use crate::domain::cart::CartOwner;
use crate::domain::errors::DomainError;
use crate::domain::notification::Notification;
use crate::domain::order::{
    generate_order_number, Address, BulkFailure, BulkUpdateResult, NewOrder, NewOrderItem, Order,
    OrderDetails, OrderFilter, OrderStatus, OrderSummary, OrderTotals, PaymentMethod,
    PaymentStatus, ShippingMethod, StatusChange,
};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{OrderRepository, ProductRepository, UserRepository};
use crate::domain::product::Product;
use crate::domain::user::User;

/// Fresh numbers drawn before a collision is reported to the caller.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub billing_address: Address,
    /// Defaults to the billing address.
    pub shipping_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    cart: CartService,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        cart: CartService,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders,
            products,
            users,
            cart,
            notifier,
        }
    }

    /// Turns the user's cart into a pending order. Every cart line must be
    /// sellable or nothing is written.
    pub fn create_order(&self, user: &User, input: PlaceOrder) -> Result<OrderSummary, DomainError> {
        let owner = CartOwner::User(user.id);
        let cart_items = self.cart.items(&owner)?;
        if cart_items.is_empty() {
            return Err(DomainError::validation("Cart is empty"));
        }

        let ids: Vec<Uuid> = cart_items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = self
            .products
            .find_many(&ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(cart_items.len());
        let mut problems = Vec::new();
        for item in &cart_items {
            match products.get(&item.product_id) {
                None => problems.push(json!({
                    "product_id": item.product_id,
                    "message": "Product not found",
                })),
                Some(p) if !p.is_active() => problems.push(json!({
                    "product_id": p.id,
                    "message": format!("{} is no longer available", p.name),
                })),
                Some(p) if !p.can_fulfil(item.quantity) => problems.push(json!({
                    "product_id": p.id,
                    "message": format!(
                        "Insufficient stock for {}. Available: {}, requested: {}",
                        p.name,
                        p.stock_quantity.max(0),
                        item.quantity
                    ),
                })),
                Some(p) => lines.push(NewOrderItem {
                    product_id: p.id,
                    product_name: p.name.clone(),
                    product_sku: p.sku.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.clone(),
                }),
            }
        }
        if !problems.is_empty() {
            return Err(DomainError::validation_with(
                "Some items in your cart cannot be ordered",
                json!(problems),
            ));
        }

        if let Some(code) = input.coupon_code.as_deref() {
            log::info!("coupon {code} recorded on order for user {} but not applied", user.id);
        }

        let totals = OrderTotals::compute(&lines, &input.shipping_method);
        let shipping_address = input
            .shipping_address
            .unwrap_or_else(|| input.billing_address.clone());
        let new_order = NewOrder {
            order_number: String::new(),
            user_id: user.id,
            billing_address: input.billing_address,
            shipping_address,
            totals,
            payment_method: input.payment_method,
            shipping_method: input.shipping_method,
            coupon_code: input.coupon_code,
            notes: input.notes,
            items: lines,
        };
        let mut attempt = 1;
        let details = loop {
            let order = NewOrder {
                order_number: generate_order_number(Utc::now()),
                ..new_order.clone()
            };
            match self.orders.place_order(order) {
                Err(DomainError::DuplicateOrderNumber(number)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    log::warn!("order number {number} already taken, drawing another");
                    attempt += 1;
                }
                placed => break placed?,
            }
        };
        self.cart.invalidate(&owner);
        log::info!(
            "order {} placed by {} for {}",
            details.order.order_number,
            user.id,
            details.order.total_amount
        );

        let summary = OrderSummary::from(&details.order);
        self.notifier.notify(Notification::OrderConfirmation {
            to: user.email.clone(),
            customer_name: user.full_name(),
            order: details,
        });
        Ok(summary)
    }

    /// Moves an order along the status machine. An illegal move is rejected
    /// before anything is written.
    pub fn transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order, DomainError> {
        let current = self.get(order_id)?.order;
        let change = StatusChange::plan(&current, target, tracking_number, Utc::now())?;

        let updated = if change.to == OrderStatus::Cancelled {
            self.orders.cancel_and_restock(order_id, &change)?
        } else {
            self.orders.update_status(order_id, &change)?
        };
        log::info!(
            "order {} moved {} -> {}",
            updated.order_number,
            change.from,
            change.to
        );
        self.notify_status_change(&updated, change.from);
        Ok(updated)
    }

    pub fn cancel_own_order(&self, user: &User, order_id: Uuid) -> Result<Order, DomainError> {
        self.get_for_user(user, order_id)?;
        self.transition(order_id, OrderStatus::Cancelled, None)
    }

    pub fn list_for_user(&self, user: &User, page: PageRequest) -> Result<Page<Order>, DomainError> {
        let filter = OrderFilter {
            user_id: Some(user.id),
            ..OrderFilter::default()
        };
        self.list_all(&filter, page)
    }

    /// Orders of other users are reported as missing.
    pub fn get_for_user(&self, user: &User, order_id: Uuid) -> Result<OrderDetails, DomainError> {
        let details = self.get(order_id)?;
        if details.order.user_id != user.id {
            return Err(DomainError::not_found("Order"));
        }
        Ok(details)
    }

    pub fn list_all(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>, DomainError> {
        let (orders, total) = self.orders.list(filter, page)?;
        Ok(Page::new(orders, total, page))
    }

    pub fn get(&self, order_id: Uuid) -> Result<OrderDetails, DomainError> {
        self.orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found("Order"))
    }

    /// Applies the same transition to each order independently and reports
    /// which ones went through.
    pub fn bulk_update_status(
        &self,
        ids: &[Uuid],
        target: OrderStatus,
        tracking_number: Option<String>,
    ) -> BulkUpdateResult {
        let mut result = BulkUpdateResult::default();
        for &id in ids {
            match self.transition(id, target, tracking_number.clone()) {
                Ok(_) => result.successful.push(id),
                Err(e) => {
                    log::warn!("bulk status update of {id} to {target} failed: {e}");
                    result.failed.push(BulkFailure {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
        result
    }

    pub fn update_payment_status(&self, order_id: Uuid, status: PaymentStatus) -> Result<Order, DomainError> {
        let order = self.orders.update_payment_status(order_id, status)?;
        log::info!("order {} payment is now {status}", order.order_number);
        Ok(order)
    }

    fn notify_status_change(&self, order: &Order, previous: OrderStatus) {
        let user = match self.users.find_by_id(order.user_id) {
            Ok(Some(user)) => user,
            Ok(None) => {
                log::warn!("order {} has no owner to notify", order.order_number);
                return;
            }
            Err(e) => {
                log::warn!("could not load owner of order {}: {e}", order.order_number);
                return;
            }
        };

        let customer_name = user.full_name();
        self.notifier.notify(Notification::StatusUpdate {
            to: user.email.clone(),
            customer_name: customer_name.clone(),
            order_number: order.order_number.clone(),
            previous,
            current: order.status,
            tracking_number: order.tracking_number.clone(),
        });
        if order.status == OrderStatus::Cancelled {
            self.notifier.notify(Notification::Cancellation {
                to: user.email,
                customer_name,
                order_number: order.order_number.clone(),
                total_amount: order.total_amount.clone(),
            });
        }
    }
}
