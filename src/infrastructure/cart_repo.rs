use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::CartItem;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartItemRepository;
use crate::schema::cart_items;

use super::models::{CartItemRow, NewCartItemRow};

pub struct DieselCartItemRepository {
    pool: DbPool,
}

impl DieselCartItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartItemRepository for DieselCartItemRepository {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = cart_items::table
            .filter(cart_items::user_id.eq(user_id))
            .order(cart_items::created_at.asc())
            .select(CartItemRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    fn insert(&self, user_id: Uuid, item: &CartItem) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                id: item.id,
                user_id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                created_at: item.added_at,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            cart_items::table
                .find(item_id)
                .filter(cart_items::user_id.eq(user_id)),
        )
        .set((
            cart_items::quantity.eq(quantity),
            cart_items::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart_items::table
                .find(item_id)
                .filter(cart_items::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(&mut conn)?;
        Ok(())
    }
}
