//! REST backend for the registration pipeline.
//!
//! Implements [`registration::CredentialIssuer`], [`registration::BlobStore`]
//! and [`registration::RecordStore`] against an identity toolkit, an object
//! storage bucket and a realtime JSON database.

mod auth;
mod backend;
mod config;
mod database;
mod error;
mod storage;
mod types;

pub use auth::AuthClient;
pub use backend::Backend;
pub use config::BackendConfig;
pub use database::DatabaseClient;
pub use error::BackendError;
pub use storage::StorageClient;
