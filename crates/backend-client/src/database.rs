//! Realtime database client for profile records.

use crate::error::BackendError;
use async_trait::async_trait;
use registration::{Identity, RecordStore, StoreError};
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct DatabaseClient {
    client: Client,
    base_url: String,
}

impl DatabaseClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/{segment}/{segment}.json` with each segment percent-encoded.
    fn record_url(&self, path: &str) -> String {
        let encoded: Vec<_> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}.json", self.base_url, encoded.join("/"))
    }

    async fn write(
        &self,
        identity: &Identity,
        path: &str,
        record: &serde_json::Value,
    ) -> Result<(), BackendError> {
        let mut request = self.client.put(self.record_url(path)).json(record);
        if let Some(token) = &identity.id_token {
            request = request.query(&[("auth", token.expose_secret())]);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), path, "Record write rejected");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for DatabaseClient {
    #[instrument(skip(self, identity, record), fields(user_id = %identity.user_id))]
    async fn put(
        &self,
        identity: &Identity,
        path: &str,
        record: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.write(identity, path, record).await?;
        debug!("Record written");
        Ok(())
    }
}
