//! Identity toolkit client.

use crate::error::BackendError;
use crate::types::{AccountResponse, ErrorEnvelope, PasswordRequest};
use async_trait::async_trait;
use registration::{AuthError, AuthErrorCode, Credential, CredentialIssuer, Identity};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

/// Creates and signs in email/password accounts.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl AuthClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn password_request(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<Identity, AuthError> {
        let body = PasswordRequest {
            email: &credential.email,
            password: credential.password.expose_secret(),
            return_secure_token: true,
        };

        let response = self
            .client
            .post(format!("{}/v1/accounts:{}", self.base_url, endpoint))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(BackendError::from)?;

        let status = response.status();
        let text = response.text().await.map_err(BackendError::from)?;

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &text));
        }

        let account: AccountResponse =
            serde_json::from_str(&text).map_err(BackendError::from)?;
        debug!(user_id = %account.local_id, "Identity response received");

        let identity = Identity::new(
            account.local_id,
            account.email.unwrap_or_else(|| credential.email.clone()),
        );
        Ok(match account.id_token {
            Some(token) => identity.with_token(token),
            None => identity,
        })
    }
}

/// Classify an error response by the provider code in its body.
fn provider_error(status: u16, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            warn!(
                status,
                code = envelope.error.code,
                message = %envelope.error.message,
                "Identity request rejected"
            );
            AuthError::from_provider(envelope.error.message.clone(), envelope.error.message)
        }
        Err(_) => {
            warn!(status, "Identity request failed with unrecognized body");
            AuthError::new(AuthErrorCode::Unknown, format!("HTTP {}", status))
        }
    }
}

#[async_trait]
impl CredentialIssuer for AuthClient {
    #[instrument(skip(self, credential), fields(email = %credential.email))]
    async fn create_account(&self, credential: &Credential) -> Result<Identity, AuthError> {
        self.password_request("signUp", credential).await
    }

    #[instrument(skip(self, credential), fields(email = %credential.email))]
    async fn sign_in(&self, credential: &Credential) -> Result<Identity, AuthError> {
        self.password_request("signInWithPassword", credential).await
    }
}
