pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod errors;
pub mod notification;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod product;
pub mod user;
pub mod wishlist;
