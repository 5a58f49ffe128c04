use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::WishlistRepository;
use crate::domain::wishlist::WishlistItem;
use crate::schema::wishlist_items;

use super::models::WishlistRow;

pub struct DieselWishlistRepository {
    pool: DbPool,
}

impl DieselWishlistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl WishlistRepository for DieselWishlistRepository {
    fn list(&self, user_id: Uuid) -> Result<Vec<WishlistItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = wishlist_items::table
            .filter(wishlist_items::user_id.eq(user_id))
            .order(wishlist_items::created_at.desc())
            .select(WishlistRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(WishlistItem::from).collect())
    }

    fn contains(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::select(exists(
            wishlist_items::table
                .filter(wishlist_items::user_id.eq(user_id))
                .filter(wishlist_items::product_id.eq(product_id)),
        ))
        .get_result(&mut conn)?)
    }

    fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(wishlist_items::table)
            .values(&WishlistRow {
                id: Uuid::new_v4(),
                user_id,
                product_id,
                created_at: Utc::now(),
            })
            .returning(WishlistRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => {
                    DomainError::Conflict("Product is already in your wishlist".to_string())
                }
                other => other,
            })?;
        Ok(row.into())
    }

    fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            wishlist_items::table
                .filter(wishlist_items::user_id.eq(user_id))
                .filter(wishlist_items::product_id.eq(product_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
