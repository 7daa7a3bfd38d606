//! Object storage client for profile images.

use crate::error::BackendError;
use crate::types::StoredObject;
use async_trait::async_trait;
use registration::{BlobStore, Identity, StoreError};
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(client: Client, base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    async fn upload(
        &self,
        identity: &Identity,
        path: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<String, BackendError> {
        let mut request = self
            .client
            .post(format!(
                "{}/v0/b/{}/o",
                self.base_url,
                urlencoding::encode(&self.bucket)
            ))
            .query(&[("uploadType", "media"), ("name", path)])
            .header("Content-Type", content_type)
            .body(payload.to_vec());

        if let Some(token) = &identity.id_token {
            request = request.header(
                "Authorization",
                format!("Firebase {}", token.expose_secret()),
            );
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), path, "Upload rejected");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let object: StoredObject = response.json().await?;
        Ok(object.name.unwrap_or_else(|| path.to_string()))
    }
}

#[async_trait]
impl BlobStore for StorageClient {
    #[instrument(skip(self, identity, payload), fields(user_id = %identity.user_id, size = payload.len()))]
    async fn store(
        &self,
        identity: &Identity,
        path: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        let stored = self.upload(identity, path, payload, content_type).await?;
        debug!(stored = %stored, "Object stored");
        Ok(stored)
    }
}
