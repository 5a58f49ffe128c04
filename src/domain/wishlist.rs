use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::product::ProductSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Option<ProductSummary>,
    pub added_at: DateTime<Utc>,
}
