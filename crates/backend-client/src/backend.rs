//! Shared construction of the three backend clients.

use crate::auth::AuthClient;
use crate::config::BackendConfig;
use crate::database::DatabaseClient;
use crate::error::BackendError;
use crate::storage::StorageClient;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Identity, storage and database clients sharing one connection pool.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<AuthClient>,
    pub storage: Arc<StorageClient>,
    pub database: Arc<DatabaseClient>,
}

impl Backend {
    /// Build all clients from configuration. Fails if a required setting is empty.
    pub fn connect(config: &BackendConfig) -> Result<Self, BackendError> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(BackendError::InvalidConfig(format!(
                "missing required backend settings: {}",
                missing.join(", ")
            )));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        info!(
            project_id = %config.project_id,
            bucket = %config.storage_bucket,
            "Backend clients configured"
        );

        Ok(Self {
            auth: Arc::new(AuthClient::new(
                client.clone(),
                &config.auth_url,
                config.api_key.clone(),
            )),
            storage: Arc::new(StorageClient::new(
                client.clone(),
                &config.storage_url,
                &config.storage_bucket,
            )),
            database: Arc::new(DatabaseClient::new(client, &config.database_url)),
        })
    }
}
