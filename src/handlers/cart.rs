use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::extractors::{cart_owner, MaybeAuthUser, SessionId};
use super::{blocking, message, ok, validated, AppState};
use crate::domain::cart::CartOwner;
use crate::errors::AppError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 100, message = "quantity must be between 1 and 100"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    /// Zero removes the line
    #[validate(range(min = 0, max = 100, message = "quantity must be between 0 and 100"))]
    pub quantity: i32,
}

fn require_owner(user: &MaybeAuthUser, session: &SessionId) -> Result<CartOwner, AppError> {
    cart_owner(user, session)
        .ok_or_else(|| AppError::bad_request("x-session-id header or sign-in required"))
}

/// GET /api/cart
///
/// Without a token or `x-session-id` the cart is simply empty.
#[utoipa::path(
    get,
    path = "/api/cart",
    params(("x-session-id" = Option<String>, Header, description = "Guest cart key")),
    responses((status = 200, description = "Cart lines with totals")),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    user: MaybeAuthUser,
    session: SessionId,
) -> Result<HttpResponse, AppError> {
    let owner = cart_owner(&user, &session);
    let cart = blocking(move || state.cart.get_cart(owner.as_ref())).await?;
    Ok(ok(cart))
}

/// POST /api/cart/items
#[utoipa::path(
    post,
    path = "/api/cart/items",
    params(("x-session-id" = Option<String>, Header, description = "Guest cart key")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart"),
        (status = 400, description = "Quantity out of range or not enough stock"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    user: MaybeAuthUser,
    session: SessionId,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let owner = require_owner(&user, &session)?;
    let body = validated(body)?;
    let cart = blocking(move || {
        state
            .cart
            .add_item(&owner, body.product_id, body.variant_id, body.quantity)
    })
    .await?;
    Ok(ok(cart))
}

/// PUT /api/cart/items/{id}
#[utoipa::path(
    put,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID"),
        ("x-session-id" = Option<String>, Header, description = "Guest cart key"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated cart"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    user: MaybeAuthUser,
    session: SessionId,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let owner = require_owner(&user, &session)?;
    let item_id = path.into_inner();
    let body = validated(body)?;
    let cart = blocking(move || state.cart.update_item(&owner, item_id, body.quantity)).await?;
    Ok(ok(cart))
}

/// DELETE /api/cart/items/{id}
#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID"),
        ("x-session-id" = Option<String>, Header, description = "Guest cart key"),
    ),
    responses(
        (status = 200, description = "Updated cart"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    user: MaybeAuthUser,
    session: SessionId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let owner = require_owner(&user, &session)?;
    let item_id = path.into_inner();
    let cart = blocking(move || state.cart.remove_item(&owner, item_id)).await?;
    Ok(ok(cart))
}

/// DELETE /api/cart
#[utoipa::path(
    delete,
    path = "/api/cart",
    params(("x-session-id" = Option<String>, Header, description = "Guest cart key")),
    responses((status = 200, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    user: MaybeAuthUser,
    session: SessionId,
) -> Result<HttpResponse, AppError> {
    let owner = require_owner(&user, &session)?;
    blocking(move || state.cart.clear(&owner)).await?;
    Ok(message("Cart cleared successfully"))
}
