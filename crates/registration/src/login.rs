//! Sign-in for registered users.

use crate::collaborators::CredentialIssuer;
use crate::error::{LoginError, ValidationReason};
use crate::types::{Credential, Identity};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Message shown for every failed sign-in, whatever the provider reported.
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect email or password. Please try again.";

pub struct LoginService {
    issuer: Arc<dyn CredentialIssuer>,
}

impl LoginService {
    pub fn new(issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self { issuer }
    }

    /// Authenticate with email and password. Empty fields are rejected
    /// without contacting the issuer.
    #[instrument(skip(self, password), fields(email = %email.trim()))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, LoginError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LoginError::Validation(ValidationReason::MissingEmail));
        }
        if password.is_empty() {
            return Err(LoginError::Validation(ValidationReason::MissingPassword));
        }

        match self.issuer.sign_in(&Credential::new(email, password)).await {
            Ok(identity) => {
                info!(user_id = %identity.user_id, "User logged in");
                Ok(identity)
            }
            Err(e) => {
                warn!(code = ?e.code, provider_code = %e.provider_code, "Login rejected");
                Err(e.into())
            }
        }
    }
}
