use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::cache::Cache;
use crate::domain::catalog::{Brand, BrandChanges, Category, CategoryChanges, NewBrand, NewCategory};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{BrandRepository, CategoryRepository, ProductRepository};
use crate::domain::product::{
    slugify, validate_pricing, NewProduct, Product, ProductChanges, ProductFilter, RecordStatus,
    StockAdjustment,
};

const LISTING_TTL: Duration = Duration::from_secs(300);
const PRODUCTS_NS: &str = "products";
const CATEGORIES_KEY: &str = "categories:active";
const BRANDS_KEY: &str = "brands:active";

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    brands: Arc<dyn BrandRepository>,
    cache: Cache,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
        brands: Arc<dyn BrandRepository>,
        cache: Cache,
    ) -> Self {
        Self {
            products,
            categories,
            brands,
            cache,
        }
    }

    // ── Products ─────────────────────────────────────────────────────────────

    pub fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, DomainError> {
        let key = format!(
            "{PRODUCTS_NS}:{}:list:{}:{}:{}",
            self.cache.generation(PRODUCTS_NS),
            filter.cache_fragment(),
            page.page,
            page.limit
        );
        if let Some(cached) = self.cache.get_json::<Page<Product>>(&key) {
            return Ok(cached);
        }
        let (items, total) = self.products.list(filter, page)?;
        let result = Page::new(items, total, page);
        self.cache.put_json(&key, &result, Some(LISTING_TTL));
        Ok(result)
    }

    /// Public lookup: inactive products are reported as missing.
    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .filter(Product::is_active)
            .ok_or_else(|| DomainError::not_found("Product"))
    }

    pub fn get_product_by_slug(&self, slug: &str) -> Result<Product, DomainError> {
        self.products
            .find_by_slug(slug)?
            .filter(Product::is_active)
            .ok_or_else(|| DomainError::not_found("Product"))
    }

    pub fn create_product(&self, mut input: NewProduct) -> Result<Product, DomainError> {
        validate_pricing(&input.base_price, input.sale_price.as_ref())?;
        if input.stock_quantity < 0 {
            return Err(DomainError::validation("Stock quantity cannot be negative"));
        }
        if input.slug.trim().is_empty() {
            input.slug = slugify(&input.name);
        }
        self.ensure_product_unique(&input.sku, &input.slug, None)?;

        let product = self.products.create(input)?;
        log::info!("created product {} ({})", product.id, product.sku);
        self.cache.bump_generation(PRODUCTS_NS);
        Ok(product)
    }

    pub fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Product, DomainError> {
        let mut product = self
            .products
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("Product"))?;
        let stock = changes.stock_quantity;
        if stock.is_some_and(|q| q < 0) {
            return Err(DomainError::validation("Stock quantity cannot be negative"));
        }
        changes.apply(&mut product);
        validate_pricing(&product.base_price, product.sale_price.as_ref())?;
        if product.is_active() {
            self.ensure_product_unique(&product.sku, &product.slug, Some(product.id))?;
        }
        product.updated_at = Utc::now();

        // The row update never writes stock, so orders placed since the read
        // above keep their decrement.
        let mut updated = self.products.update(&product)?;
        if let Some(quantity) = stock {
            updated = self.products.adjust_stock(id, StockAdjustment::Set(quantity))?;
        }
        self.cache.bump_generation(PRODUCTS_NS);
        Ok(updated)
    }

    /// Soft delete: the row stays for order history, but leaves listings and
    /// frees its sku/slug.
    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        self.update_product(
            id,
            ProductChanges {
                status: Some(RecordStatus::Inactive),
                ..ProductChanges::default()
            },
        )?;
        log::info!("deactivated product {id}");
        Ok(())
    }

    pub fn adjust_stock(&self, id: Uuid, adjustment: StockAdjustment) -> Result<Product, DomainError> {
        adjustment.validate()?;
        let product = self.products.adjust_stock(id, adjustment)?;
        self.cache.bump_generation(PRODUCTS_NS);
        Ok(product)
    }

    fn ensure_product_unique(
        &self,
        sku: &str,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<(), DomainError> {
        if self.products.sku_taken(sku, except)? {
            return Err(DomainError::Conflict(format!(
                "A product with SKU '{sku}' already exists"
            )));
        }
        if self.products.slug_taken(slug, except)? {
            return Err(DomainError::Conflict(format!(
                "A product with slug '{slug}' already exists"
            )));
        }
        Ok(())
    }

    // ── Categories ───────────────────────────────────────────────────────────

    pub fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        if let Some(cached) = self.cache.get_json(CATEGORIES_KEY) {
            return Ok(cached);
        }
        let categories = self.categories.list_active()?;
        self.cache.put_json(CATEGORIES_KEY, &categories, Some(LISTING_TTL));
        Ok(categories)
    }

    pub fn get_category(&self, id: Uuid) -> Result<Category, DomainError> {
        self.categories
            .find_by_id(id)?
            .filter(|c| c.status == RecordStatus::Active)
            .ok_or_else(|| DomainError::not_found("Category"))
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.categories
            .find_by_slug(slug)?
            .filter(|c| c.status == RecordStatus::Active)
            .ok_or_else(|| DomainError::not_found("Category"))
    }

    pub fn create_category(&self, mut input: NewCategory) -> Result<Category, DomainError> {
        if input.slug.trim().is_empty() {
            input.slug = slugify(&input.name);
        }
        if self.categories.slug_taken(&input.slug, None)? {
            return Err(DomainError::Conflict(format!(
                "A category with slug '{}' already exists",
                input.slug
            )));
        }
        if let Some(parent) = input.parent_id {
            self.get_category(parent)?;
        }
        let category = self.categories.create(input)?;
        self.cache.invalidate(CATEGORIES_KEY);
        Ok(category)
    }

    pub fn update_category(&self, id: Uuid, changes: CategoryChanges) -> Result<Category, DomainError> {
        let mut category = self
            .categories
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("Category"))?;
        if changes.parent_id == Some(id) {
            return Err(DomainError::validation("A category cannot be its own parent"));
        }
        changes.apply(&mut category);
        if category.status == RecordStatus::Active
            && self.categories.slug_taken(&category.slug, Some(id))?
        {
            return Err(DomainError::Conflict(format!(
                "A category with slug '{}' already exists",
                category.slug
            )));
        }
        category.updated_at = Utc::now();
        let updated = self.categories.update(&category)?;
        self.cache.invalidate(CATEGORIES_KEY);
        Ok(updated)
    }

    pub fn delete_category(&self, id: Uuid) -> Result<(), DomainError> {
        self.update_category(
            id,
            CategoryChanges {
                status: Some(RecordStatus::Inactive),
                ..CategoryChanges::default()
            },
        )?;
        Ok(())
    }

    // ── Brands ───────────────────────────────────────────────────────────────

    pub fn list_brands(&self) -> Result<Vec<Brand>, DomainError> {
        if let Some(cached) = self.cache.get_json(BRANDS_KEY) {
            return Ok(cached);
        }
        let brands = self.brands.list_active()?;
        self.cache.put_json(BRANDS_KEY, &brands, Some(LISTING_TTL));
        Ok(brands)
    }

    pub fn get_brand(&self, id: Uuid) -> Result<Brand, DomainError> {
        self.brands
            .find_by_id(id)?
            .filter(|b| b.status == RecordStatus::Active)
            .ok_or_else(|| DomainError::not_found("Brand"))
    }

    pub fn get_brand_by_slug(&self, slug: &str) -> Result<Brand, DomainError> {
        self.brands
            .find_by_slug(slug)?
            .filter(|b| b.status == RecordStatus::Active)
            .ok_or_else(|| DomainError::not_found("Brand"))
    }

    pub fn create_brand(&self, mut input: NewBrand) -> Result<Brand, DomainError> {
        if input.slug.trim().is_empty() {
            input.slug = slugify(&input.name);
        }
        if self.brands.slug_taken(&input.slug, None)? {
            return Err(DomainError::Conflict(format!(
                "A brand with slug '{}' already exists",
                input.slug
            )));
        }
        let brand = self.brands.create(input)?;
        self.cache.invalidate(BRANDS_KEY);
        Ok(brand)
    }

    pub fn update_brand(&self, id: Uuid, changes: BrandChanges) -> Result<Brand, DomainError> {
        let mut brand = self
            .brands
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("Brand"))?;
        changes.apply(&mut brand);
        if brand.status == RecordStatus::Active && self.brands.slug_taken(&brand.slug, Some(id))? {
            return Err(DomainError::Conflict(format!(
                "A brand with slug '{}' already exists",
                brand.slug
            )));
        }
        brand.updated_at = Utc::now();
        let updated = self.brands.update(&brand)?;
        self.cache.invalidate(BRANDS_KEY);
        Ok(updated)
    }

    pub fn delete_brand(&self, id: Uuid) -> Result<(), DomainError> {
        self.update_brand(
            id,
            BrandChanges {
                status: Some(RecordStatus::Inactive),
                ..BrandChanges::default()
            },
        )?;
        Ok(())
    }
}
