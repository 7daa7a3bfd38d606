//! Registration pipeline for the attendance kiosk.
//!
//! A [`RegistrationOrchestrator`] turns a signup form plus a captured photo
//! into an account, a stored profile image and a profile record, talking to
//! the backend only through the [`CredentialIssuer`], [`BlobStore`] and
//! [`RecordStore`] traits.

mod collaborators;
mod error;
mod login;
mod orchestrator;
mod types;

pub use collaborators::{BlobStore, CredentialIssuer, RecordStore};
pub use error::{
    AuthError, AuthErrorCode, LoginError, RegistrationError, StoreError, ValidationReason,
};
pub use login::{LoginService, LOGIN_FAILED_MESSAGE};
pub use orchestrator::RegistrationOrchestrator;
pub use types::*;
