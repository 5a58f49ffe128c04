use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::ports::ObjectStorage;

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Base URL of the storage service, without a trailing slash.
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

/// Bucket storage over the `/storage/v1/object` HTTP API.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    settings: StorageSettings,
}

impl HttpObjectStorage {
    pub fn new(mut settings: StorageSettings) -> Self {
        settings.url = settings.url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.settings.url, self.settings.bucket, path
        )
    }

    fn upload_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.settings.url, self.settings.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        let response = self
            .client
            .post(self.upload_url(path))
            .bearer_auth(&self.settings.service_key)
            .header("apikey", &self.settings.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| DomainError::Internal(format!("storage request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("storage upload of {path} failed with {status}: {body}");
            return Err(DomainError::Internal(format!(
                "storage upload failed with status {status}"
            )));
        }
        Ok(self.public_url(path))
    }
}

/// Used when no storage service is configured. Every upload fails.
pub struct UnconfiguredStorage;

#[async_trait]
impl ObjectStorage for UnconfiguredStorage {
    async fn upload(&self, path: &str, _: &str, _: Vec<u8>) -> Result<String, DomainError> {
        log::warn!("rejected upload of {path}: STORAGE_URL/STORAGE_KEY not set");
        Err(DomainError::Internal(
            "object storage is not configured".to_string(),
        ))
    }
}
