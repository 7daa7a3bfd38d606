//! Remote collaborators consumed by the registration pipeline.

use crate::error::{AuthError, StoreError};
use crate::types::{Credential, Identity};
use async_trait::async_trait;

/// Creates and authenticates account identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn create_account(&self, credential: &Credential) -> Result<Identity, AuthError>;

    async fn sign_in(&self, credential: &Credential) -> Result<Identity, AuthError>;
}

/// Durable storage for opaque payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `payload` under `path`, returning the stored path.
    async fn store(
        &self,
        identity: &Identity,
        path: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError>;
}

/// Durable storage for structured records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(
        &self,
        identity: &Identity,
        path: &str,
        record: &serde_json::Value,
    ) -> Result<(), StoreError>;
}
