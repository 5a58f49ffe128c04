use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ObjectStorage;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Stores a product image under a fresh name and returns its public URL.
    pub async fn upload_product_image(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let ext = IMAGE_TYPES
            .iter()
            .find(|(t, _)| *t == mime)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                DomainError::validation("Only JPEG, PNG and WebP images are allowed")
            })?;
        if bytes.is_empty() {
            return Err(DomainError::validation("No file uploaded"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DomainError::validation("File size must not exceed 5MB"));
        }

        let path = format!("products/{}.{ext}", Uuid::new_v4());
        let size = bytes.len();
        let url = self.storage.upload(&path, &mime, bytes).await?;
        log::info!("uploaded {path} ({size} bytes)");
        Ok(url)
    }
}
