use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrder, Order, OrderDetails, OrderFilter, OrderItem, OrderStatus, PaymentStatus,
    StatusChange,
};
use crate::domain::pagination::PageRequest;
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, order_items, orders};

use super::models::{
    address_json, convert_all, NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow,
    StatusChangeset,
};
use super::product_repo::{decrement_stock, increment_stock};

const ORDER_NUMBER_KEY: &str = "orders_order_number_key";

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
    let rows = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::line_no.asc())
        .select(OrderItemRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
}

fn filtered(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(user_id) = filter.user_id {
        query = query.filter(orders::user_id.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.to_string()));
    }
    if let Some(payment) = filter.payment_status {
        query = query.filter(orders::payment_status.eq(payment.to_string()));
    }
    query
}

/// Writes a status change, guarded on the status it was planned from so a
/// concurrent change is not silently overwritten.
fn write_status(conn: &mut PgConnection, id: Uuid, change: &StatusChange) -> Result<Order, DomainError> {
    let row = diesel::update(
        orders::table
            .find(id)
            .filter(orders::status.eq(change.from.to_string())),
    )
    .set(&StatusChangeset {
        status: change.to.as_ref(),
        tracking_number: change.tracking_number.as_deref(),
        shipped_at: change.shipped_at,
        delivered_at: change.delivered_at,
        cancelled_at: change.cancelled_at,
        updated_at: change.at,
    })
    .returning(OrderRow::as_returning())
    .get_result(conn)
    .optional()?;

    match row {
        Some(row) => Order::try_from(row),
        None => {
            let exists: i64 = orders::table.find(id).count().get_result(conn)?;
            if exists == 0 {
                Err(DomainError::not_found("Order"))
            } else {
                Err(DomainError::Conflict(
                    "Order status was changed by another request".to_string(),
                ))
            }
        }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn place_order(&self, order: NewOrder) -> Result<OrderDetails, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_id = Uuid::new_v4();
            let row: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    order_number: order.order_number.clone(),
                    user_id: order.user_id,
                    status: OrderStatus::Pending.to_string(),
                    payment_status: PaymentStatus::Pending.to_string(),
                    billing_address: address_json(&order.billing_address)?,
                    shipping_address: address_json(&order.shipping_address)?,
                    subtotal: order.totals.subtotal.clone(),
                    shipping_amount: order.totals.shipping_amount.clone(),
                    tax_amount: order.totals.tax_amount.clone(),
                    discount_amount: order.totals.discount_amount.clone(),
                    total_amount: order.totals.total_amount.clone(),
                    payment_method: order.payment_method.to_string(),
                    shipping_method: order.shipping_method.to_string(),
                    coupon_code: order.coupon_code.clone(),
                    notes: order.notes.clone(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(ORDER_NUMBER_KEY) =>
                    {
                        DomainError::DuplicateOrderNumber(order.order_number.clone())
                    }
                    other => DomainError::from(other),
                })?;

            // 2. Insert the denormalized order items
            let new_items: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .zip(1..)
                .map(|(item, line_no)| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    product_sku: item.product_sku.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.clone(),
                    total_price: item.total_price(),
                    line_no,
                })
                .collect();
            let mut item_rows: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemRow::as_returning())
                .get_results(conn)?;
            item_rows.sort_by_key(|row| row.line_no);

            // 3. Take the stock. A lost race on any line rolls back the lot.
            for item in &order.items {
                decrement_stock(conn, item.product_id, item.quantity)?;
            }

            // 4. Empty the cart
            diesel::delete(cart_items::table.filter(cart_items::user_id.eq(order.user_id)))
                .execute(conn)?;

            Ok(OrderDetails {
                order: Order::try_from(row)?,
                items: item_rows.into_iter().map(OrderItem::from).collect(),
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetails>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_items(&mut conn, order.id)?;
        Ok(Some(OrderDetails {
            order: Order::try_from(order)?,
            items,
        }))
    }

    fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(filter).count().get_result(conn)?;

            let rows = filtered(filter)
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .then_order_by(orders::id.asc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            Ok((convert_all(rows)?, total))
        })
    }

    fn update_status(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        write_status(&mut conn, id, change)
    }

    fn cancel_and_restock(&self, id: Uuid, change: &StatusChange) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = write_status(conn, id, change)?;
            for item in load_items(conn, id)? {
                increment_stock(conn, item.product_id, item.quantity)?;
            }
            Ok(order)
        })
    }

    fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(orders::table.find(id))
            .set((
                orders::payment_status.eq(status.to_string()),
                orders::updated_at.eq(chrono::Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Order"))?;
        Order::try_from(row)
    }
}
