use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::{admin, auth, brands, cart, categories, health, orders, products, upload, users, wishlist};
use crate::domain::order::{Address, OrderStatus, PaymentMethod, PaymentStatus, ShippingMethod};
use crate::domain::product::{ProductSort, RecordStatus, StockStatus};
use crate::domain::user::{Role, UserStatus};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Storefront API", description = "Supplements store REST API"),
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        auth::update_profile,
        auth::change_password,
        products::list_products,
        products::get_product,
        products::get_product_by_slug,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::adjust_stock,
        categories::list_categories,
        categories::get_category,
        categories::get_category_by_slug,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        brands::list_brands,
        brands::get_brand,
        brands::get_brand_by_slug,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        admin::dashboard,
        admin::sales_report,
        admin::list_orders,
        admin::get_order,
        admin::update_status,
        admin::bulk_update_status,
        admin::update_payment,
        users::list_users,
        users::get_user,
        users::change_role,
        users::change_status,
        wishlist::list,
        wishlist::add,
        wishlist::remove,
        wishlist::check,
        upload::product_image,
    ),
    components(schemas(
        health::HealthResponse,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::UpdateProfileRequest,
        auth::ChangePasswordRequest,
        products::CreateProductRequest,
        products::UpdateProductRequest,
        products::StockOperation,
        products::StockRequest,
        categories::CreateCategoryRequest,
        categories::UpdateCategoryRequest,
        brands::CreateBrandRequest,
        brands::UpdateBrandRequest,
        cart::AddItemRequest,
        cart::UpdateItemRequest,
        orders::CreateOrderRequest,
        admin::UpdateStatusRequest,
        admin::BulkStatusRequest,
        admin::UpdatePaymentRequest,
        users::ChangeRoleRequest,
        users::ChangeStatusRequest,
        wishlist::AddToWishlistRequest,
        wishlist::WishlistItemResponse,
        wishlist::WishlistCheckResponse,
        upload::UploadResponse,
        Address,
        OrderStatus,
        PaymentStatus,
        PaymentMethod,
        ShippingMethod,
        StockStatus,
        RecordStatus,
        ProductSort,
        Role,
        UserStatus,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration, sign-in and profile"),
        (name = "products", description = "Product catalog"),
        (name = "categories", description = "Product categories"),
        (name = "brands", description = "Product brands"),
        (name = "cart", description = "Shopping cart for users and guest sessions"),
        (name = "orders", description = "Customer orders"),
        (name = "admin", description = "Order management and dashboard"),
        (name = "users", description = "User administration"),
        (name = "wishlist", description = "Saved products"),
        (name = "upload", description = "Product image upload"),
    )
)]
pub struct ApiDoc;
