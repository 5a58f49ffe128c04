use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use super::extractors::AuthUser;
use super::{created, AppState};
use crate::domain::user::Permission;
use crate::errors::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload/product-image
///
/// The image is the raw request body; its type comes from `Content-Type`.
#[utoipa::path(
    post,
    path = "/api/upload/product-image",
    request_body(content = Vec<u8>, content_type = "image/png", description = "JPEG, PNG or WebP, at most 5MB"),
    responses(
        (status = 201, description = "Stored, public URL returned", body = UploadResponse),
        (status = 400, description = "Empty, too large or unsupported type"),
        (status = 403, description = "Upload permission required"),
    ),
    security(("bearer" = [])),
    tag = "upload"
)]
pub async fn product_image(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::UploadMedia)?;
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let url = state
        .uploads
        .upload_product_image(&content_type, body.to_vec())
        .await?;
    Ok(created(UploadResponse { url }))
}
