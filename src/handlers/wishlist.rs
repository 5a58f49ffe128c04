use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extractors::AuthUser;
use super::{blocking, created, message, ok, AppState};
use crate::domain::wishlist::WishlistItem;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToWishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub added_at: DateTime<Utc>,
}

impl From<WishlistItem> for WishlistItemResponse {
    fn from(item: WishlistItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            added_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistCheckResponse {
    pub in_wishlist: bool,
}

/// GET /api/wishlist
#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses((status = 200, description = "Saved products, newest first")),
    security(("bearer" = [])),
    tag = "wishlist"
)]
pub async fn list(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
) -> Result<HttpResponse, AppError> {
    let entries = blocking(move || state.wishlist.list(user.id)).await?;
    Ok(ok(entries))
}

/// POST /api/wishlist
#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = AddToWishlistRequest,
    responses(
        (status = 201, description = "Added", body = WishlistItemResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Already saved"),
    ),
    security(("bearer" = [])),
    tag = "wishlist"
)]
pub async fn add(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<AddToWishlistRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = body.into_inner().product_id;
    let item = blocking(move || state.wishlist.add(user.id, product_id)).await?;
    Ok(created(WishlistItemResponse::from(item)))
}

/// DELETE /api/wishlist/{product_id}
#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Not in the wishlist"),
    ),
    security(("bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    blocking(move || state.wishlist.remove(user.id, product_id)).await?;
    Ok(message("Removed from wishlist"))
}

/// GET /api/wishlist/check/{product_id}
#[utoipa::path(
    get,
    path = "/api/wishlist/check/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Membership flag", body = WishlistCheckResponse)),
    security(("bearer" = [])),
    tag = "wishlist"
)]
pub async fn check(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let in_wishlist = blocking(move || state.wishlist.contains(user.id, product_id)).await?;
    Ok(ok(WishlistCheckResponse { in_wishlist }))
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
    async fn add_check_and_remove() {
        let store = MemoryStore::new();
        let user = store.add_user("buyer@example.test", Role::Customer);
        let product = store.insert_product(new_product("Multivitamin", "MV-1", 900, 30));
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let add = || {
            test::TestRequest::post()
                .uri("/api/wishlist")
                .insert_header(bearer(&store, &user))
                .set_json(json!({ "product_id": product.id }))
                .to_request()
        };
        assert_eq!(test::call_service(&app, add()).await.status(), StatusCode::CREATED);
        assert_eq!(test::call_service(&app, add()).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/wishlist/check/{}", product.id))
            .insert_header(bearer(&store, &user))
            .to_request();
        assert_eq!(json(test::call_service(&app, req).await).await["data"]["in_wishlist"], true);

        let req = test::TestRequest::get()
            .uri("/api/wishlist")
            .insert_header(bearer(&store, &user))
            .to_request();
        let body = json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"][0]["product"]["sku"], "MV-1");

        let remove = || {
            test::TestRequest::delete()
                .uri(&format!("/api/wishlist/{}", product.id))
                .insert_header(bearer(&store, &user))
                .to_request()
        };
        assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, remove()).await.status(), StatusCode::NOT_FOUND);
    }
}
