pub mod admin_service;
pub mod auth_service;
pub mod cache;
pub mod cart_service;
pub mod catalog_service;
pub mod notifier;
pub mod order_service;
pub mod password;
pub mod tokens;
pub mod upload_service;
pub mod user_service;
pub mod wishlist_service;
