//! Backend client errors.

use registration::{AuthError, AuthErrorCode, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Api { status, message } => StoreError::Rejected { status, message },
            BackendError::Json(e) => StoreError::Serialization(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(e: BackendError) -> Self {
        AuthError::new(AuthErrorCode::Unknown, e.to_string())
    }
}
