//! Backend connection settings.

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Web API key sent on identity requests
    pub api_key: SecretString,

    pub project_id: String,

    /// Realtime database root, e.g. `https://<project>.firebaseio.com`
    pub database_url: String,

    pub storage_bucket: String,

    /// Identity toolkit base URL
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Object storage base URL
    #[serde(default = "default_storage_url")]
    pub storage_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com".into()
}

fn default_storage_url() -> String {
    "https://firebasestorage.googleapis.com".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl BackendConfig {
    /// Names of required settings that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        use secrecy::ExposeSecret;

        let mut missing = Vec::new();
        if self.api_key.expose_secret().trim().is_empty() {
            missing.push("api_key");
        }
        if self.project_id.trim().is_empty() {
            missing.push("project_id");
        }
        if self.database_url.trim().is_empty() {
            missing.push("database_url");
        }
        if self.storage_bucket.trim().is_empty() {
            missing.push("storage_bucket");
        }
        missing
    }
}
