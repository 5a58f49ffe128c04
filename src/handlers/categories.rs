use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::extractors::AuthUser;
use super::{blocking, created, message, ok, validated, AppState};
use crate::domain::catalog::{CategoryChanges, NewCategory};
use crate::domain::product::RecordStatus;
use crate::domain::user::Permission;
use crate::errors::AppError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub status: Option<RecordStatus>,
}

/// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories by sort order")),
    tag = "categories"
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = blocking(move || state.catalog.list_categories()).await?;
    Ok(ok(categories))
}

/// GET /api/categories/{id}
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found"),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let category = blocking(move || state.catalog.get_category(id)).await?;
    Ok(ok(category))
}

/// GET /api/categories/slug/{slug}
#[utoipa::path(
    get,
    path = "/api/categories/slug/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category found"),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn get_category_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slug = path.into_inner();
    let category = blocking(move || state.catalog.get_category_by_slug(&slug)).await?;
    Ok(ok(category))
}

/// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let body = validated(body)?;
    let input = NewCategory {
        name: body.name,
        slug: body.slug.unwrap_or_default(),
        description: body.description,
        image_url: body.image_url,
        parent_id: body.parent_id,
        sort_order: body.sort_order,
    };
    let category = blocking(move || state.catalog.create_category(input)).await?;
    Ok(created(category))
}

/// PUT /api/categories/{id}
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn update_category(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    let body = validated(body)?;
    let changes = CategoryChanges {
        name: body.name,
        slug: body.slug,
        description: body.description,
        image_url: body.image_url,
        parent_id: body.parent_id,
        sort_order: body.sort_order,
        status: body.status,
    };
    let category = blocking(move || state.catalog.update_category(id, changes)).await?;
    Ok(ok(category))
}

/// DELETE /api/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deactivated"),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    blocking(move || state.catalog.delete_category(id)).await?;
    Ok(message("Category deleted successfully"))
}
