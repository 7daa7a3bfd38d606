//! Registration data model.

use crate::error::StoreError;
use media_capture::CapturedImage;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage path of a user's profile image. Depends only on the user id,
/// so re-uploads overwrite.
pub fn profile_image_path(user_id: &str) -> String {
    format!("profileImages/{}", user_id)
}

/// Database key of a user's profile record.
pub fn user_record_path(user_id: &str) -> String {
    format!("users/{}", user_id)
}

/// Email and password handed to the credential issuer.
#[derive(Debug, Clone)]
pub struct Credential {
    pub email: String,
    pub password: SecretString,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Input of a registration attempt, as submitted by the signup form.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub captured_image: Option<CapturedImage>,
}

impl RegistrationRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
        captured_image: Option<CapturedImage>,
    ) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
            confirm_password: SecretString::new(confirm_password.into()),
            captured_image,
        }
    }

    pub fn passwords_match(&self) -> bool {
        self.password.expose_secret() == self.confirm_password.expose_secret()
    }

    pub(crate) fn credential(&self) -> Credential {
        Credential {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Account identity issued by the credential issuer.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Durable join key between account, image and profile record.
    pub user_id: String,
    pub email: String,
    /// Bearer token authorizing storage calls on behalf of this user.
    pub id_token: Option<SecretString>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            id_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(SecretString::new(token.into()));
        self
    }
}

/// Persisted profile of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub email: String,
    /// `None` only when the image upload failed.
    pub profile_image_path: Option<String>,
}

/// Steps of the registration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Idle,
    Validating,
    CreatingAccount,
    UploadingImage,
    PersistingRecord,
    Succeeded,
    Failed,
}

impl RegistrationState {
    /// Succeeded and Failed end an attempt; the machine then returns to Idle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationState::Succeeded | RegistrationState::Failed)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationState::Idle => "idle",
            RegistrationState::Validating => "validating",
            RegistrationState::CreatingAccount => "creating_account",
            RegistrationState::UploadingImage => "uploading_image",
            RegistrationState::PersistingRecord => "persisting_record",
            RegistrationState::Succeeded => "succeeded",
            RegistrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A state change published to an attached observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub email: String,
    pub state: RegistrationState,
}

/// Result of a successful, possibly degraded, registration.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user_id: String,
    pub email: String,
    pub profile_image_path: Option<String>,
    /// Set when the photo could not be stored and the profile was saved without it.
    pub image_upload_error: Option<StoreError>,
}

impl RegistrationOutcome {
    pub fn is_degraded(&self) -> bool {
        self.image_upload_error.is_some()
    }
}
