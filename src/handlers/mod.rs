pub mod admin;
pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod extractors;
pub mod health;
pub mod openapi;
pub mod orders;
pub mod products;
pub mod upload;
pub mod users;
pub mod wishlist;

use std::sync::Arc;

use actix_web::{error, web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::admin_service::AdminService;
use crate::application::auth_service::AuthService;
use crate::application::cache::Cache;
use crate::application::cart_service::CartService;
use crate::application::catalog_service::CatalogService;
use crate::application::notifier::Notifier;
use crate::application::order_service::OrderService;
use crate::application::tokens::TokenService;
use crate::application::upload_service::UploadService;
use crate::application::user_service::UserService;
use crate::application::wishlist_service::WishlistService;
use crate::domain::errors::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::ports::{CacheStore, ObjectStorage};
use crate::errors::AppError;
use crate::infrastructure::cart_store::{DurableCartStore, SessionCartStore};
use crate::infrastructure::Repositories;

/// Largest accepted upload body; the service enforces the exact image limit.
pub const MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub orders: OrderService,
    pub users: UserService,
    pub wishlist: WishlistService,
    pub admin: AdminService,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        cache_store: Arc<dyn CacheStore>,
        tokens: TokenService,
        notifier: Notifier,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let cache = Cache::new(cache_store);
        let cart = CartService::new(
            repos.products.clone(),
            Arc::new(DurableCartStore::new(repos.cart_items.clone())),
            Arc::new(SessionCartStore::new(cache.clone())),
            cache.clone(),
        );
        Self {
            auth: AuthService::new(repos.users.clone(), tokens),
            catalog: CatalogService::new(
                repos.products.clone(),
                repos.categories.clone(),
                repos.brands.clone(),
                cache,
            ),
            orders: OrderService::new(
                repos.orders.clone(),
                repos.products.clone(),
                repos.users.clone(),
                cart.clone(),
                notifier,
            ),
            cart,
            users: UserService::new(repos.users.clone()),
            wishlist: WishlistService::new(repos.wishlist.clone(), repos.products.clone()),
            admin: AdminService::new(repos.analytics, repos.orders, repos.products),
            uploads: UploadService::new(storage),
        }
    }
}

// ── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(Envelope {
        success: true,
        data,
    })
}

pub fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "message": text }))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Runs repository-bound service code on the blocking pool.
pub async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    Ok(web::block(f).await??)
}

pub fn validated<T: Validate>(body: web::Json<T>) -> Result<T, AppError> {
    let body = body.into_inner();
    body.validate()?;
    Ok(body)
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,
    /// Items per page (default 20, max 100)
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

// ── Extractor error bodies ───────────────────────────────────────────────────

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        error::InternalError::from_response(
            err.to_string(),
            actix_web::ResponseError::error_response(&AppError::bad_request(format!(
                "Invalid request body: {err}"
            ))),
        )
        .into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        error::InternalError::from_response(
            err.to_string(),
            actix_web::ResponseError::error_response(&AppError::bad_request(format!(
                "Invalid query string: {err}"
            ))),
        )
        .into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        error::InternalError::from_response(
            err.to_string(),
            actix_web::ResponseError::error_response(&AppError::bad_request(format!(
                "Invalid path parameter: {err}"
            ))),
        )
        .into()
    })
}

pub fn upload_config() -> web::PayloadConfig {
    web::PayloadConfig::new(MAX_UPLOAD_BYTES)
}

// ── Routing ──────────────────────────────────────────────────────────────────

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/health", web::get().to(health::health))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/refresh", web::post().to(auth::refresh))
                        .route("/me", web::get().to(auth::me))
                        .route("/profile", web::put().to(auth::update_profile))
                        .route("/password", web::put().to(auth::change_password)),
                )
                .service(
                    web::scope("/products")
                        .route("", web::get().to(products::list_products))
                        .route("", web::post().to(products::create_product))
                        .route("/slug/{slug}", web::get().to(products::get_product_by_slug))
                        .route("/{id}", web::get().to(products::get_product))
                        .route("/{id}", web::put().to(products::update_product))
                        .route("/{id}", web::delete().to(products::delete_product))
                        .route("/{id}/stock", web::patch().to(products::adjust_stock)),
                )
                .service(
                    web::scope("/categories")
                        .route("", web::get().to(categories::list_categories))
                        .route("", web::post().to(categories::create_category))
                        .route("/slug/{slug}", web::get().to(categories::get_category_by_slug))
                        .route("/{id}", web::get().to(categories::get_category))
                        .route("/{id}", web::put().to(categories::update_category))
                        .route("/{id}", web::delete().to(categories::delete_category)),
                )
                .service(
                    web::scope("/brands")
                        .route("", web::get().to(brands::list_brands))
                        .route("", web::post().to(brands::create_brand))
                        .route("/slug/{slug}", web::get().to(brands::get_brand_by_slug))
                        .route("/{id}", web::get().to(brands::get_brand))
                        .route("/{id}", web::put().to(brands::update_brand))
                        .route("/{id}", web::delete().to(brands::delete_brand)),
                )
                .service(
                    web::scope("/cart")
                        .route("", web::get().to(cart::get_cart))
                        .route("", web::delete().to(cart::clear_cart))
                        .route("/items", web::post().to(cart::add_item))
                        .route("/items/{id}", web::put().to(cart::update_item))
                        .route("/items/{id}", web::delete().to(cart::remove_item)),
                )
                .service(
                    web::scope("/orders")
                        .route("", web::post().to(orders::create_order))
                        .route("", web::get().to(orders::list_orders))
                        .route("/{id}", web::get().to(orders::get_order))
                        .route("/{id}/cancel", web::post().to(orders::cancel_order)),
                )
                .service(
                    web::scope("/admin")
                        .route("/dashboard", web::get().to(admin::dashboard))
                        .route("/analytics/sales", web::get().to(admin::sales_report))
                        .route("/orders", web::get().to(admin::list_orders))
                        .route("/orders/bulk-status", web::patch().to(admin::bulk_update_status))
                        .route("/orders/{id}", web::get().to(admin::get_order))
                        .route("/orders/{id}/status", web::patch().to(admin::update_status))
                        .route("/orders/{id}/payment", web::patch().to(admin::update_payment)),
                )
                .service(
                    web::scope("/users")
                        .route("", web::get().to(users::list_users))
                        .route("/{id}", web::get().to(users::get_user))
                        .route("/{id}/role", web::patch().to(users::change_role))
                        .route("/{id}/status", web::patch().to(users::change_status)),
                )
                .service(
                    web::scope("/wishlist")
                        .route("", web::get().to(wishlist::list))
                        .route("", web::post().to(wishlist::add))
                        .route("/check/{product_id}", web::get().to(wishlist::check))
                        .route("/{product_id}", web::delete().to(wishlist::remove)),
                )
                .service(
                    web::scope("/upload")
                        .app_data(upload_config())
                        .route("/product-image", web::post().to(upload::product_image)),
                ),
        );
}
