//! Registration error taxonomy.

use std::fmt;
use thiserror::Error;

/// Why local validation rejected a request. No remote call is made for any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    PasswordMismatch,
    MissingPhoto,
    MissingEmail,
    MissingPassword,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::PasswordMismatch => "password_mismatch",
            ValidationReason::MissingPhoto => "missing_photo",
            ValidationReason::MissingEmail => "missing_email",
            ValidationReason::MissingPassword => "missing_password",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationReason::PasswordMismatch => "Passwords do not match.",
            ValidationReason::MissingPhoto => "Please capture a photo before proceeding.",
            ValidationReason::MissingEmail => "Please enter an email address.",
            ValidationReason::MissingPassword => "Please enter a password.",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable classification of credential-issuer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailInUse,
    InvalidEmail,
    WeakPassword,
    /// Sign-in only: unknown email or wrong password.
    InvalidCredentials,
    Unknown,
}

impl AuthErrorCode {
    /// Map a provider error code to the taxonomy.
    ///
    /// Accepts both REST codes (`EMAIL_EXISTS`) and SDK codes
    /// (`auth/email-already-in-use`). REST codes may carry a detail suffix,
    /// e.g. `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_provider_code(code: &str) -> Self {
        let code = code.trim();
        let head = code
            .split(|c: char| c == ' ' || c == ':')
            .next()
            .unwrap_or_default();

        match head {
            "EMAIL_EXISTS" | "auth/email-already-in-use" => AuthErrorCode::EmailInUse,
            "INVALID_EMAIL" | "auth/invalid-email" => AuthErrorCode::InvalidEmail,
            "WEAK_PASSWORD" | "auth/weak-password" => AuthErrorCode::WeakPassword,
            "EMAIL_NOT_FOUND"
            | "INVALID_PASSWORD"
            | "INVALID_LOGIN_CREDENTIALS"
            | "auth/wrong-password"
            | "auth/user-not-found"
            | "auth/invalid-credential" => AuthErrorCode::InvalidCredentials,
            _ => AuthErrorCode::Unknown,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            AuthErrorCode::EmailInUse => "EMAIL_IN_USE",
            AuthErrorCode::InvalidEmail => "INVALID_EMAIL",
            AuthErrorCode::WeakPassword => "WEAK_PASSWORD",
            AuthErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthErrorCode::Unknown => "AUTH_FAILED",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthErrorCode::EmailInUse => "The email address is already in use.",
            AuthErrorCode::InvalidEmail => "The email address is not valid.",
            AuthErrorCode::WeakPassword => "The password is too weak.",
            AuthErrorCode::InvalidCredentials => "Incorrect email or password. Please try again.",
            AuthErrorCode::Unknown => "Signup Failed",
        }
    }
}

/// Failure reported by a [`CredentialIssuer`](crate::CredentialIssuer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code:?}: {message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    /// Raw provider code, kept for logs.
    pub provider_code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            provider_code: String::new(),
            message: message.into(),
        }
    }

    /// Build from a provider code, classifying it.
    pub fn from_provider(provider_code: impl Into<String>, message: impl Into<String>) -> Self {
        let provider_code = provider_code.into();
        Self {
            code: AuthErrorCode::from_provider_code(&provider_code),
            provider_code,
            message: message.into(),
        }
    }
}

/// Failure reported by a [`BlobStore`](crate::BlobStore) or [`RecordStore`](crate::RecordStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or timed out.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with an error.
    #[error("Storage rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Terminal failure of a registration attempt.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReason),

    #[error("Account creation failed: {0}")]
    Auth(#[from] AuthError),

    /// The account (and possibly the image) exist remotely but the profile
    /// record does not.
    #[error("Profile record for user {user_id} could not be persisted: {source}")]
    RecordPersistFailure {
        user_id: String,
        profile_image_path: Option<String>,
        #[source]
        source: StoreError,
    },

    #[error("Registration already in progress for {0}")]
    AlreadyInProgress(String),
}

impl RegistrationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::Validation(reason) => match reason {
                ValidationReason::PasswordMismatch => "PASSWORD_MISMATCH",
                ValidationReason::MissingPhoto => "MISSING_PHOTO",
                ValidationReason::MissingEmail => "MISSING_EMAIL",
                ValidationReason::MissingPassword => "MISSING_PASSWORD",
            },
            RegistrationError::Auth(e) => e.code.as_code(),
            RegistrationError::RecordPersistFailure { .. } => "RECORD_PERSIST_FAILURE",
            RegistrationError::AlreadyInProgress(_) => "REGISTRATION_IN_PROGRESS",
        }
    }

    /// Human-readable message for the person at the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            RegistrationError::Validation(reason) => reason.user_message(),
            RegistrationError::Auth(e) => e.code.user_message(),
            RegistrationError::RecordPersistFailure { .. } => {
                "Your account was created but your profile could not be saved."
            }
            RegistrationError::AlreadyInProgress(_) => {
                "A registration for this email is already in progress."
            }
        }
    }
}

/// Failure of a sign-in attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// A required field was empty; the issuer was not contacted.
    #[error("Validation failed: {0}")]
    Validation(ValidationReason),

    #[error("Sign-in rejected: {0}")]
    Auth(#[from] AuthError),
}

impl LoginError {
    pub fn code(&self) -> &'static str {
        match self {
            LoginError::Validation(ValidationReason::MissingEmail) => "MISSING_EMAIL",
            LoginError::Validation(_) => "MISSING_PASSWORD",
            LoginError::Auth(e) => e.code.as_code(),
        }
    }
}
