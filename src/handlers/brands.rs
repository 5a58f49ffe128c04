use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::extractors::AuthUser;
use super::{blocking, created, message, ok, validated, AppState};
use crate::domain::catalog::{BrandChanges, NewBrand};
use crate::domain::product::RecordStatus;
use crate::domain::user::Permission;
use crate::errors::AppError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBrandRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: Option<RecordStatus>,
}

/// GET /api/brands
#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "Active brands by name")),
    tag = "brands"
)]
pub async fn list_brands(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let brands = blocking(move || state.catalog.list_brands()).await?;
    Ok(ok(brands))
}

/// GET /api/brands/{id}
#[utoipa::path(
    get,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand found"),
        (status = 404, description = "Brand not found"),
    ),
    tag = "brands"
)]
pub async fn get_brand(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let brand = blocking(move || state.catalog.get_brand(id)).await?;
    Ok(ok(brand))
}

/// GET /api/brands/slug/{slug}
#[utoipa::path(
    get,
    path = "/api/brands/slug/{slug}",
    params(("slug" = String, Path, description = "Brand slug")),
    responses(
        (status = 200, description = "Brand found"),
        (status = 404, description = "Brand not found"),
    ),
    tag = "brands"
)]
pub async fn get_brand_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let slug = path.into_inner();
    let brand = blocking(move || state.catalog.get_brand_by_slug(&slug)).await?;
    Ok(ok(brand))
}

/// POST /api/brands
#[utoipa::path(
    post,
    path = "/api/brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Brand created"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer" = [])),
    tag = "brands"
)]
pub async fn create_brand(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateBrandRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let body = validated(body)?;
    let input = NewBrand {
        name: body.name,
        slug: body.slug.unwrap_or_default(),
        description: body.description,
        logo_url: body.logo_url,
    };
    let brand = blocking(move || state.catalog.create_brand(input)).await?;
    Ok(created(brand))
}

/// PUT /api/brands/{id}
#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Brand updated"),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer" = [])),
    tag = "brands"
)]
pub async fn update_brand(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBrandRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    let body = validated(body)?;
    let changes = BrandChanges {
        name: body.name,
        slug: body.slug,
        description: body.description,
        logo_url: body.logo_url,
        status: body.status,
    };
    let brand = blocking(move || state.catalog.update_brand(id, changes)).await?;
    Ok(ok(brand))
}

/// DELETE /api/brands/{id}
#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand deactivated"),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer" = [])),
    tag = "brands"
)]
pub async fn delete_brand(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageCatalog)?;
    let id = path.into_inner();
    blocking(move || state.catalog.delete_brand(id)).await?;
    Ok(message("Brand deleted successfully"))
}
