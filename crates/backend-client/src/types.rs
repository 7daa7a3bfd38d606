//! Wire types for the backend REST APIs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoredObject {
    #[serde(default)]
    pub name: Option<String>,
}
