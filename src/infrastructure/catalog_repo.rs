use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Brand, Category, NewBrand, NewCategory};
use crate::domain::errors::DomainError;
use crate::domain::ports::{BrandRepository, CategoryRepository};
use crate::domain::product::RecordStatus;
use crate::schema::{brands, categories};

use super::models::{convert_all, BrandRow, BrandValues, CategoryRow, CategoryValues};

fn active() -> String {
    RecordStatus::Active.to_string()
}

// ── Categories ───────────────────────────────────────────────────────────────

pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CategoryRepository for DieselCategoryRepository {
    fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(categories::table)
            .values((
                categories::id.eq(Uuid::new_v4()),
                CategoryValues {
                    name: category.name,
                    slug: category.slug,
                    description: category.description,
                    image_url: category.image_url,
                    parent_id: category.parent_id,
                    sort_order: category.sort_order,
                    status: active(),
                },
            ))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)?;
        Category::try_from(row)
    }

    fn update(&self, category: &Category) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(categories::table.find(category.id))
            .set((
                CategoryValues {
                    name: category.name.clone(),
                    slug: category.slug.clone(),
                    description: category.description.clone(),
                    image_url: category.image_url.clone(),
                    parent_id: category.parent_id,
                    sort_order: category.sort_order,
                    status: category.status.to_string(),
                },
                categories::updated_at.eq(category.updated_at),
            ))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Category"))?;
        Category::try_from(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        categories::table
            .find(id)
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Category::try_from)
            .transpose()
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        categories::table
            .filter(categories::slug.eq(slug))
            .filter(categories::status.eq(active()))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Category::try_from)
            .transpose()
    }

    fn list_active(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .filter(categories::status.eq(active()))
            .order((categories::sort_order.asc(), categories::name.asc()))
            .select(CategoryRow::as_select())
            .load(&mut conn)?;
        convert_all(rows)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = categories::table
            .filter(categories::slug.eq(slug))
            .filter(categories::status.eq(active()))
            .into_boxed();
        if let Some(id) = except {
            query = query.filter(categories::id.ne(id));
        }
        let count: i64 = query.count().get_result(&mut conn)?;
        Ok(count > 0)
    }
}

// ── Brands ───────────────────────────────────────────────────────────────────

pub struct DieselBrandRepository {
    pool: DbPool,
}

impl DieselBrandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BrandRepository for DieselBrandRepository {
    fn create(&self, brand: NewBrand) -> Result<Brand, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(brands::table)
            .values((
                brands::id.eq(Uuid::new_v4()),
                BrandValues {
                    name: brand.name,
                    slug: brand.slug,
                    description: brand.description,
                    logo_url: brand.logo_url,
                    status: active(),
                },
            ))
            .returning(BrandRow::as_returning())
            .get_result(&mut conn)?;
        Brand::try_from(row)
    }

    fn update(&self, brand: &Brand) -> Result<Brand, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(brands::table.find(brand.id))
            .set((
                BrandValues {
                    name: brand.name.clone(),
                    slug: brand.slug.clone(),
                    description: brand.description.clone(),
                    logo_url: brand.logo_url.clone(),
                    status: brand.status.to_string(),
                },
                brands::updated_at.eq(brand.updated_at),
            ))
            .returning(BrandRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Brand"))?;
        Brand::try_from(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Brand>, DomainError> {
        let mut conn = self.pool.get()?;
        brands::table
            .find(id)
            .select(BrandRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Brand::try_from)
            .transpose()
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Brand>, DomainError> {
        let mut conn = self.pool.get()?;
        brands::table
            .filter(brands::slug.eq(slug))
            .filter(brands::status.eq(active()))
            .select(BrandRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Brand::try_from)
            .transpose()
    }

    fn list_active(&self) -> Result<Vec<Brand>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = brands::table
            .filter(brands::status.eq(active()))
            .order(brands::name.asc())
            .select(BrandRow::as_select())
            .load(&mut conn)?;
        convert_all(rows)
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = brands::table
            .filter(brands::slug.eq(slug))
            .filter(brands::status.eq(active()))
            .into_boxed();
        if let Some(id) = except {
            query = query.filter(brands::id.ne(id));
        }
        let count: i64 = query.count().get_result(&mut conn)?;
        Ok(count > 0)
    }
}
