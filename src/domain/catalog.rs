use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::RecordStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub status: Option<RecordStatus>,
}

impl CategoryChanges {
    pub fn apply(self, category: &mut Category) {
        if let Some(v) = self.name {
            category.name = v;
        }
        if let Some(v) = self.slug {
            category.slug = v;
        }
        if let Some(v) = self.description {
            category.description = Some(v);
        }
        if let Some(v) = self.image_url {
            category.image_url = Some(v);
        }
        if let Some(v) = self.parent_id {
            category.parent_id = Some(v);
        }
        if let Some(v) = self.sort_order {
            category.sort_order = v;
        }
        if let Some(v) = self.status {
            category.status = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBrand {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BrandChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: Option<RecordStatus>,
}

impl BrandChanges {
    pub fn apply(self, brand: &mut Brand) {
        if let Some(v) = self.name {
            brand.name = v;
        }
        if let Some(v) = self.slug {
            brand.slug = v;
        }
        if let Some(v) = self.description {
            brand.description = Some(v);
        }
        if let Some(v) = self.logo_url {
            brand.logo_url = Some(v);
        }
        if let Some(v) = self.status {
            brand.status = v;
        }
    }
}
