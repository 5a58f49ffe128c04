use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::analytics::{SaleRecord, SoldItem};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::AnalyticsRepository;
use crate::domain::user::Role;
use crate::schema::{order_items, orders, users};

use super::models::parse_enum;

pub struct DieselAnalyticsRepository {
    pool: DbPool,
}

impl DieselAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn cancelled() -> String {
    OrderStatus::Cancelled.to_string()
}

impl AnalyticsRepository for DieselAnalyticsRepository {
    fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<(String, i64)> = orders::table
            .group_by(orders::status)
            .select((orders::status, count_star()))
            .load(&mut conn)?;
        rows.into_iter()
            .map(|(status, n)| Ok((parse_enum("order status", &status)?, n)))
            .collect()
    }

    fn revenue(&self) -> Result<BigDecimal, DomainError> {
        let mut conn = self.pool.get()?;
        let total: Option<BigDecimal> = orders::table
            .filter(orders::status.ne(cancelled()))
            .select(sum(orders::total_amount))
            .first(&mut conn)?;
        Ok(total.unwrap_or_default())
    }

    fn count_users(&self, role: Role) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(users::table
            .filter(users::role.eq(role.to_string()))
            .count()
            .get_result(&mut conn)?)
    }

    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SaleRecord>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<(DateTime<Utc>, BigDecimal)> = orders::table
            .filter(orders::created_at.ge(since))
            .filter(orders::status.ne(cancelled()))
            .select((orders::created_at, orders::total_amount))
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(created_at, total_amount)| SaleRecord {
                created_at,
                total_amount,
            })
            .collect())
    }

    fn items_sold_since(&self, since: DateTime<Utc>) -> Result<Vec<SoldItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<(uuid::Uuid, String, i32, BigDecimal)> = order_items::table
            .inner_join(orders::table)
            .filter(orders::created_at.ge(since))
            .filter(orders::status.ne(cancelled()))
            .select((
                order_items::product_id,
                order_items::product_name,
                order_items::quantity,
                order_items::total_price,
            ))
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(product_id, product_name, quantity, total_price)| SoldItem {
                product_id,
                product_name,
                quantity,
                total_price,
            })
            .collect())
    }
}
