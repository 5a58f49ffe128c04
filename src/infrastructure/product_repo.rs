use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Numeric};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    NewProduct, Product, ProductFilter, ProductSort, RecordStatus, StockAdjustment, StockStatus,
    LOW_STOCK_THRESHOLD,
};
use crate::schema::products;

use super::models::{convert_all, NewProductRow, ProductChangeset, ProductRow};

const EFFECTIVE_PRICE: &str = "COALESCE(products.sale_price, products.base_price)";

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn active() -> String {
    RecordStatus::Active.to_string()
}

fn filtered(filter: &ProductFilter) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if !filter.include_inactive {
        query = query.filter(products::status.eq(active()));
    }
    if let Some(id) = filter.category_id {
        query = query.filter(products::category_id.eq(id));
    }
    if let Some(id) = filter.brand_id {
        query = query.filter(products::brand_id.eq(id));
    }
    if let Some(text) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{text}%");
        query = query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::sku.ilike(pattern)),
        );
    }
    if let Some(min) = &filter.min_price {
        query = query.filter(sql::<Bool>(&format!("{EFFECTIVE_PRICE} >= ")).bind::<Numeric, _>(min.clone()));
    }
    if let Some(max) = &filter.max_price {
        query = query.filter(sql::<Bool>(&format!("{EFFECTIVE_PRICE} <= ")).bind::<Numeric, _>(max.clone()));
    }
    if let Some(status) = filter.stock_status {
        query = query.filter(products::stock_status.eq(status.to_string()));
    }
    if let Some(featured) = filter.featured {
        query = query.filter(products::is_featured.eq(featured));
    }
    query
}

fn load_product(conn: &mut PgConnection, id: Uuid) -> Result<Option<Product>, DomainError> {
    products::table
        .find(id)
        .select(ProductRow::as_select())
        .first(conn)
        .optional()?
        .map(Product::try_from)
        .transpose()
}

/// Rewrites the stored stock status to match `quantity`.
fn sync_stock_status(conn: &mut PgConnection, id: Uuid, quantity: i32) -> Result<Product, DomainError> {
    let row = diesel::update(products::table.find(id))
        .set((
            products::stock_status.eq(StockStatus::from_quantity(quantity).to_string()),
            products::updated_at.eq(Utc::now()),
        ))
        .returning(ProductRow::as_returning())
        .get_result(conn)?;
    Product::try_from(row)
}

/// Takes `quantity` units off the shelf only if that many remain.
/// Must run inside the caller's transaction.
pub(crate) fn decrement_stock(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: i32,
) -> Result<Product, DomainError> {
    let remaining: Option<i32> = diesel::update(
        products::table
            .find(id)
            .filter(products::stock_quantity.ge(quantity)),
    )
    .set(products::stock_quantity.eq(products::stock_quantity - quantity))
    .returning(products::stock_quantity)
    .get_result(conn)
    .optional()?;

    match remaining {
        Some(left) => sync_stock_status(conn, id, left),
        None => {
            let product = load_product(conn, id)?.ok_or_else(|| DomainError::not_found("Product"))?;
            Err(DomainError::InsufficientStock {
                product: product.name,
                requested: quantity,
                available: product.stock_quantity,
            })
        }
    }
}

/// Puts `quantity` units back. Must run inside the caller's transaction.
pub(crate) fn increment_stock(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: i32,
) -> Result<Product, DomainError> {
    let total: i32 = diesel::update(products::table.find(id))
        .set(products::stock_quantity.eq(products::stock_quantity + quantity))
        .returning(products::stock_quantity)
        .get_result(conn)?;
    sync_stock_status(conn, id, total)
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                stock_status: StockStatus::from_quantity(product.stock_quantity).to_string(),
                status: active(),
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
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Product::try_from(row)
    }

    fn update(&self, product: &Product) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(product.id))
            .set(ProductChangeset::from(product))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Product"))?;
        Product::try_from(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        load_product(&mut conn, id)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        products::table
            .filter(products::slug.eq(slug))
            .filter(products::status.eq(active()))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Product::try_from)
            .transpose()
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        convert_all(rows)
    }

    fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(filter).count().get_result(conn)?;

            let query = filtered(filter).select(ProductRow::as_select());
            let query = match filter.sort {
                ProductSort::Newest => query.order(products::created_at.desc()),
                ProductSort::PriceAsc => query.order(sql::<Numeric>(EFFECTIVE_PRICE).asc()),
                ProductSort::PriceDesc => query.order(sql::<Numeric>(EFFECTIVE_PRICE).desc()),
                ProductSort::Name => query.order(products::name.asc()),
            };
            let rows = query
                .then_order_by(products::id.asc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            Ok((convert_all(rows)?, total))
        })
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = products::table
            .filter(products::sku.eq(sku))
            .filter(products::status.eq(active()))
            .into_boxed();
        if let Some(id) = except {
            query = query.filter(products::id.ne(id));
        }
        let count: i64 = query.count().get_result(&mut conn)?;
        Ok(count > 0)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = products::table
            .filter(products::slug.eq(slug))
            .filter(products::status.eq(active()))
            .into_boxed();
        if let Some(id) = except {
            query = query.filter(products::id.ne(id));
        }
        let count: i64 = query.count().get_result(&mut conn)?;
        Ok(count > 0)
    }

    fn adjust_stock(&self, id: Uuid, adjustment: StockAdjustment) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| match adjustment {
            StockAdjustment::Set(quantity) => {
                let updated = diesel::update(products::table.find(id))
                    .set(products::stock_quantity.eq(quantity))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(DomainError::not_found("Product"));
                }
                sync_stock_status(conn, id, quantity)
            }
            StockAdjustment::Add(quantity) => increment_stock(conn, id, quantity)
                .map_err(|e| match e {
                    DomainError::NotFound(_) => DomainError::not_found("Product"),
                    other => other,
                }),
            StockAdjustment::Subtract(quantity) => decrement_stock(conn, id, quantity),
        })
    }

    fn low_stock(&self, limit: i64) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::status.eq(active()))
            .filter(products::stock_quantity.le(LOW_STOCK_THRESHOLD))
            .order((products::stock_quantity.asc(), products::name.asc()))
            .limit(limit)
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        convert_all(rows)
    }

    fn count_active(&self) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(products::table
            .filter(products::status.eq(active()))
            .count()
            .get_result(&mut conn)?)
    }
}
