use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::extractors::{AuthUser, MaybeAuthUser};
use super::{blocking, created, message, ok, validated, AppState};
use crate::domain::pagination::PageRequest;
use crate::domain::product::{
    NewProduct, ProductChanges, ProductFilter, ProductSort, RecordStatus, StockAdjustment,
    StockStatus,
};
use crate::domain::user::Permission;
use crate::errors::AppError;

/// Distinguishes an explicit `null` (clear the field) from an absent one.
pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Matches name or SKU, case-insensitively
    pub search: Option<String>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<BigDecimal>,
    pub stock_status: Option<StockStatus>,
    pub featured: Option<bool>,
    /// Only honoured for catalog managers
    pub include_inactive: Option<bool>,
    pub sort: Option<ProductSort>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    pub name_local: Option<String>,
    /// Derived from the name when omitted
    #[validate(length(max = 255))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100, message = "sku is required"))]
    pub sku: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "2500.00")]
    pub base_price: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<BigDecimal>,
    #[serde(default)]
    #[validate(range(min = 0, message = "stock quantity cannot be negative"))]
    pub stock_quantity: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub name_local: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub base_price: Option<BigDecimal>,
    /// `null` removes the sale price
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Option<BigDecimal>>,
    #[validate(range(min = 0, message = "stock quantity cannot be negative"))]
    pub stock_quantity: Option<i32>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_featured: Option<bool>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockRequest {
    pub operation: StockOperation,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,
}

impl From<StockRequest> for StockAdjustment {
    fn from(req: StockRequest) -> Self {
        match req.operation {
            StockOperation::Set => StockAdjustment::Set(req.quantity),
            StockOperation::Add => StockAdjustment::Add(req.quantity),
            StockOperation::Subtract => StockAdjustment::Subtract(req.quantity),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses((status = 200, description = "Paginated active products")),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    query: web::Query<ProductListQuery>,
) -> Result<HttpResponse, AppError> {
    let q = query.into_inner();
    let can_manage = user
        .as_ref()
        .is_some_and(|u| u.require(Permission::ManageCatalog).is_ok());
    let filter = ProductFilter {
        category_id: q.category_id,
        brand_id: q.brand_id,
        search: q.search.filter(|s| !s.trim().is_empty()),
        min_price: q.min_price,
        max_price: q.max_price,
        stock_status: q.stock_status,
        featured: q.featured,
        include_inactive: can_manage && q.include_inactive.unwrap_or(false),
        sort: q.sort.unwrap_or_default(),
    };
    let page = PageRequest::new(q.page, q.limit);
    let products = blocking(move || state.catalog.list_products(&filter, page)).await?;
    Ok(ok(products))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = blocking(move || state.catalog.get_product(id)).await?;
    Ok(ok(product))
}

/// GET /api/products/slug/{slug}
#[utoipa::path(
    get,
    path = "/api/products/slug/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found or inactive"),
    ),
    tag = "products"
)]
pub async fn get_product_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slug = path.into_inner();
    let product = blocking(move || state.catalog.get_product_by_slug(&slug)).await?;
    Ok(ok(product))
}

/// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Catalog permission required"),
        (status = 409, description = "SKU or slug already in use"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let body = validated(body)?;
    let input = NewProduct {
        name: body.name,
        name_local: body.name_local,
        slug: body.slug.unwrap_or_default(),
        sku: body.sku,
        description: body.description,
        base_price: body.base_price,
        sale_price: body.sale_price,
        stock_quantity: body.stock_quantity,
        images: body.images,
        category_id: body.category_id,
        brand_id: body.brand_id,
        is_featured: body.is_featured,
    };
    let product = blocking(move || state.catalog.create_product(input)).await?;
    Ok(created(product))
}

/// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "SKU or slug already in use"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    let body = validated(body)?;
    let changes = ProductChanges {
        name: body.name,
        name_local: body.name_local,
        slug: body.slug,
        sku: body.sku,
        description: body.description,
        base_price: body.base_price,
        sale_price: body.sale_price,
        stock_quantity: body.stock_quantity,
        images: body.images,
        category_id: body.category_id,
        brand_id: body.brand_id,
        is_featured: body.is_featured,
        status: body.status,
    };
    let product = blocking(move || state.catalog.update_product(id, changes)).await?;
    Ok(ok(product))
}

/// DELETE /api/products/{id}
///
/// Soft delete: the product is marked inactive and disappears from listings.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deactivated"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    blocking(move || state.catalog.delete_product(id)).await?;
    Ok(message("Product deleted successfully"))
}

/// PATCH /api/products/{id}/stock
#[utoipa::path(
    patch,
    path = "/api/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockRequest,
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 400, description = "Would drop below zero"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn adjust_stock(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<StockRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    let adjustment = StockAdjustment::from(validated(body)?);
    let product = blocking(move || state.catalog.adjust_stock(id, adjustment)).await?;
    Ok(ok(product))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::json;

    use crate::domain::user::Role;
    use crate::handlers::routes;
    use crate::handlers::test_support::{bearer, json, state};
    use crate::testing::{new_product, MemoryStore};

    #[actix_web::test]
    async fn admin_creates_and_public_reads_by_slug() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(&store, &admin))
            .set_json(json!({
                "name": "Creatine Monohydrate",
                "sku": "CRE-300",
                "base_price": "3200",
                "sale_price": "2900",
                "stock_quantity": 8
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json(resp).await;
        assert_eq!(body["data"]["slug"], "creatine-monohydrate");
        assert_eq!(body["data"]["stock_status"], "low_stock");

        let req = test::TestRequest::get()
            .uri("/api/products/slug/creatine-monohydrate")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["data"]["sku"], "CRE-300");
    }

    #[actix_web::test]
    async fn customers_cannot_write_the_catalog() {
        let store = MemoryStore::new();
        let customer = store.add_user("buyer@example.test", Role::Customer);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let body = json!({ "name": "Omega 3", "sku": "OM-3", "base_price": "1500" });
        let anonymous = test::TestRequest::post()
            .uri("/api/products")
            .set_json(&body)
            .to_request();
        assert_eq!(
            test::call_service(&app, anonymous).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(&store, &customer))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn deleted_products_leave_the_public_listing() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let keep = store.insert_product(new_product("Whey Protein", "WHEY-1", 2500, 20));
        let gone = store.insert_product(new_product("Old Stock", "OLD-1", 900, 5));
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/products/{}", gone.id))
            .insert_header(bearer(&store, &admin))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let body = json(test::call_service(&app, req).await).await;
        let items = body["data"]["items"].as_array().expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], keep.id.to_string());
        assert_eq!(body["data"]["pagination"]["total"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{}", gone.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn stock_subtract_below_zero_is_rejected() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let product = store.insert_product(new_product("BCAA", "BCAA-1", 1800, 3));
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/api/products/{}/stock", product.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "operation": "subtract", "quantity": 5 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.product(product.id).stock_quantity, 3);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/products/{}/stock", product.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "operation": "add", "quantity": 10 }))
            .to_request();
        let body = json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["stock_quantity"], 13);
        assert_eq!(body["data"]["stock_status"], "in_stock");
    }

    #[actix_web::test]
    async fn page_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        store.insert_product(new_product("Whey Protein", "WHEY-1", 2500, 20));
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/products?page={}&limit=50", i64::MAX))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["data"]["items"].as_array().expect("items").len(), 0);
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[actix_web::test]
    async fn bad_uuid_in_path_is_a_400_envelope() {
        let store = MemoryStore::new();
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/products/not-a-uuid").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["success"], false);
    }
}
