use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::extractors::AuthUser;
use super::{blocking, created, ok, validated, AppState, PageQuery};
use crate::application::order_service::PlaceOrder;
use crate::domain::order::{Address, PaymentMethod, ShippingMethod};
use crate::errors::AppError;

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(nested)]
    pub billing_address: Address,
    /// Defaults to the billing address
    #[validate(nested)]
    pub shipping_address: Option<Address>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    #[validate(length(max = 50))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Turns the caller's cart into a pending order. Stock is decremented and the
/// cart emptied in the same transaction as the order insert, so either the
/// whole order is placed or nothing changes.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed"),
        (status = 400, description = "Empty cart or unsellable lines"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    let input = PlaceOrder {
        billing_address: body.billing_address,
        shipping_address: body.shipping_address,
        payment_method: body.payment_method,
        shipping_method: body.shipping_method,
        coupon_code: body.coupon_code.filter(|c| !c.trim().is_empty()),
        notes: body.notes,
    };
    let summary = blocking(move || state.orders.create_order(&user, input)).await?;
    Ok(created(summary))
}

/// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    params(PageQuery),
    responses((status = 200, description = "The caller's orders, newest first")),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.request();
    let orders = blocking(move || state.orders.list_for_user(&user, page)).await?;
    Ok(ok(orders))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its items"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = blocking(move || state.orders.get_for_user(&user, id)).await?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled, stock restored"),
        (status = 400, description = "Order can no longer be cancelled"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = blocking(move || state.orders.cancel_own_order(&user, id)).await?;
    Ok(ok(order))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::domain::notification::Notification;
    use crate::domain::order::OrderStatus;
    use crate::domain::user::Role;
    use crate::handlers::routes;
    use crate::handlers::test_support::{bearer, json, state};
    use crate::testing::{address, new_product, MemoryStore};

    fn order_body() -> Value {
        json!({
            "billing_address": address(),
            "payment_method": "cash_on_delivery",
            "shipping_method": "standard"
        })
    }

    #[actix_web::test]
    async fn placing_an_order_empties_the_cart() {
        let store = MemoryStore::new();
        let user = store.add_user("buyer@example.test", Role::Customer);
        let whey = store.insert_product(new_product("Whey Protein", "WHEY-1", 2500, 20));
        let omega = store.insert_product(new_product("Omega 3", "OM-3", 1200, 10));
        let (state, mut rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        for (product_id, quantity) in [(whey.id, 2), (omega.id, 1)] {
            let req = test::TestRequest::post()
                .uri("/api/cart/items")
                .insert_header(bearer(&store, &user))
                .set_json(json!({ "product_id": product_id, "quantity": quantity }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(bearer(&store, &user))
            .set_json(order_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json(resp).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["total_amount"], "6600");
        let order_id = body["data"]["id"].as_str().expect("order id").to_string();

        assert_eq!(store.product(whey.id).stock_quantity, 18);
        assert_eq!(store.product(omega.id).stock_quantity, 9);

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header(bearer(&store, &user))
            .to_request();
        let cart = json(test::call_service(&app, req).await).await;
        assert_eq!(cart["data"]["item_count"], 0);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{order_id}"))
            .insert_header(bearer(&store, &user))
            .to_request();
        let details = json(test::call_service(&app, req).await).await;
        assert_eq!(details["data"]["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(details["data"]["subtotal"], "6200");
        assert_eq!(details["data"]["shipping_amount"], "400");

        match rx.try_recv() {
            Ok(Notification::OrderConfirmation { to, .. }) => assert_eq!(to, "buyer@example.test"),
            other => panic!("expected an order confirmation, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn one_short_line_blocks_the_whole_order() {
        let store = MemoryStore::new();
        let user = store.add_user("buyer@example.test", Role::Customer);
        let a = store.insert_product(new_product("Product A", "A-1", 1000, 10));
        let b = store.insert_product(new_product("Product B", "B-1", 500, 5));
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        for (product_id, quantity) in [(a.id, 5), (b.id, 2)] {
            let req = test::TestRequest::post()
                .uri("/api/cart/items")
                .insert_header(bearer(&store, &user))
                .set_json(json!({ "product_id": product_id, "quantity": quantity }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
        let mut scarce = store.product(b.id);
        scarce.set_stock(1);
        store.replace_product(scarce);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(bearer(&store, &user))
            .set_json(order_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json(resp).await;
        assert_eq!(body["error"]["details"][0]["product_id"], b.id.to_string());

        assert_eq!(store.order_count(), 0);
        assert_eq!(store.product(a.id).stock_quantity, 10);
        assert_eq!(store.product(b.id).stock_quantity, 1);

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header(bearer(&store, &user))
            .to_request();
        let cart = json(test::call_service(&app, req).await).await;
        assert_eq!(cart["data"]["item_count"], 7);
    }

    #[actix_web::test]
    async fn empty_cart_cannot_be_ordered() {
        let store = MemoryStore::new();
        let user = store.add_user("buyer@example.test", Role::Customer);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(bearer(&store, &user))
            .set_json(order_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["error"]["message"], "Cart is empty");
    }

    #[actix_web::test]
    async fn cancelling_restores_stock_and_hides_other_users_orders() {
        let store = MemoryStore::new();
        let owner = store.add_user("owner@example.test", Role::Customer);
        let stranger = store.add_user("stranger@example.test", Role::Customer);
        let product = store.insert_product(new_product("Creatine", "CRE-1", 3000, 5));
        let order = store.seed_order(&owner, OrderStatus::Pending, &[(&product, 2)]);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/cancel", order.id))
            .insert_header(bearer(&store, &stranger))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/cancel", order.id))
            .insert_header(bearer(&store, &owner))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["data"]["status"], "cancelled");
        assert_eq!(store.product(product.id).stock_quantity, 7);

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/cancel", order.id))
            .insert_header(bearer(&store, &owner))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.product(product.id).stock_quantity, 7);
    }

    #[actix_web::test]
    async fn orders_require_a_token() {
        let store = MemoryStore::new();
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(resp).await["error"]["message"], "Access token required");
    }
}
