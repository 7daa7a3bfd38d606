//! Registration state machine.
//!
//! `Idle → Validating → CreatingAccount → UploadingImage → PersistingRecord → Succeeded | Failed`
//!
//! Validation happens before any remote call. Account-creation failures abort
//! before anything is written. A failed image upload is not fatal: the profile
//! is persisted without a photo and the outcome is marked degraded. A failed
//! record write is fatal even though the account, and possibly the image,
//! already exist remotely; the orphaned user id is logged and returned in the
//! error. There is no compensating delete and no retry.
//!
//! After a terminal state the machine is back in `Idle`, ready for the next
//! attempt; observers see that as a final `Idle` transition.

use crate::collaborators::{BlobStore, CredentialIssuer, RecordStore};
use crate::error::{RegistrationError, StoreError, ValidationReason};
use crate::types::{
    profile_image_path, user_record_path, Identity, ProfileRecord, RegistrationOutcome,
    RegistrationRequest, RegistrationState, StateTransition,
};
use media_capture::CapturedImage;
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, warn};

/// Sequences credential creation, photo upload and profile persistence.
///
/// Collaborators are injected once at startup; the orchestrator keeps no
/// per-user state apart from the set of emails with a registration in flight.
pub struct RegistrationOrchestrator {
    issuer: Arc<dyn CredentialIssuer>,
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    observer: Option<UnboundedSender<StateTransition>>,
}

impl RegistrationOrchestrator {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            issuer,
            blobs,
            records,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            observer: None,
        }
    }

    /// Publish every state transition to `observer`.
    pub fn with_observer(mut self, observer: UnboundedSender<StateTransition>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run one registration attempt to a terminal state.
    #[instrument(skip(self, request), fields(email = %request.email.trim()))]
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let email = request.email.trim().to_string();
        let result = self.run(&email, &request).await;

        match &result {
            Ok(outcome) => {
                self.transition(&email, RegistrationState::Succeeded);
                info!(
                    user_id = %outcome.user_id,
                    degraded = outcome.is_degraded(),
                    "Registration succeeded"
                );
            }
            Err(e) => {
                self.transition(&email, RegistrationState::Failed);
                warn!(code = e.code(), error = %e, "Registration failed");
            }
        }

        result
    }

    async fn run(
        &self,
        email: &str,
        request: &RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        self.transition(email, RegistrationState::Validating);
        let image = validate(request).map_err(RegistrationError::Validation)?;

        let _guard = InFlightGuard::claim(&self.in_flight, email)
            .ok_or_else(|| RegistrationError::AlreadyInProgress(email.to_string()))?;

        self.transition(email, RegistrationState::CreatingAccount);
        let identity = self
            .issuer
            .create_account(&request.credential())
            .await
            .map_err(|e| {
                warn!(
                    code = ?e.code,
                    provider_code = %e.provider_code,
                    "Account creation rejected"
                );
                e
            })?;
        info!(user_id = %identity.user_id, "Account created");

        self.transition(email, RegistrationState::UploadingImage);
        let (stored_path, image_upload_error) = self.upload_image(&identity, image).await;

        self.transition(email, RegistrationState::PersistingRecord);
        let record = ProfileRecord {
            email: if identity.email.is_empty() {
                email.to_string()
            } else {
                identity.email.clone()
            },
            profile_image_path: stored_path.clone(),
        };
        self.persist_record(&identity, &record).await?;

        Ok(RegistrationOutcome {
            user_id: identity.user_id,
            email: record.email,
            profile_image_path: stored_path,
            image_upload_error,
        })
    }

    /// Store the photo. Errors are returned alongside, never propagated.
    async fn upload_image(
        &self,
        identity: &Identity,
        image: &CapturedImage,
    ) -> (Option<String>, Option<StoreError>) {
        let path = profile_image_path(&identity.user_id);

        match self
            .blobs
            .store(identity, &path, image.bytes(), image.content_type())
            .await
        {
            Ok(stored) => {
                debug!(user_id = %identity.user_id, path = %stored, "Profile image stored");
                (Some(stored), None)
            }
            Err(e) => {
                warn!(
                    user_id = %identity.user_id,
                    error = %e,
                    "Profile image upload failed, continuing without photo"
                );
                (None, Some(e))
            }
        }
    }

    async fn persist_record(
        &self,
        identity: &Identity,
        record: &ProfileRecord,
    ) -> Result<(), RegistrationError> {
        let path = user_record_path(&identity.user_id);
        let orphaned = |source: StoreError| {
            error!(
                user_id = %identity.user_id,
                profile_image_path = ?record.profile_image_path,
                error = %source,
                "Profile record not persisted; account exists without a profile"
            );
            RegistrationError::RecordPersistFailure {
                user_id: identity.user_id.clone(),
                profile_image_path: record.profile_image_path.clone(),
                source,
            }
        };

        let value = serde_json::to_value(record).map_err(|e| orphaned(e.into()))?;
        self.records
            .put(identity, &path, &value)
            .await
            .map_err(orphaned)?;

        debug!(user_id = %identity.user_id, path = %path, "Profile record persisted");
        Ok(())
    }

    fn transition(&self, email: &str, state: RegistrationState) {
        debug!(state = %state, "Registration state");
        self.publish(email, state);
        if state.is_terminal() {
            self.publish(email, RegistrationState::Idle);
        }
    }

    fn publish(&self, email: &str, state: RegistrationState) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(StateTransition {
                email: email.to_string(),
                state,
            });
        }
    }
}

/// Local checks, in order. The photo check must follow the password check.
fn validate(request: &RegistrationRequest) -> Result<&CapturedImage, ValidationReason> {
    if !request.passwords_match() {
        return Err(ValidationReason::PasswordMismatch);
    }
    let image = request
        .captured_image
        .as_ref()
        .ok_or(ValidationReason::MissingPhoto)?;
    if request.email.trim().is_empty() {
        return Err(ValidationReason::MissingEmail);
    }
    if request.password.expose_secret().is_empty() {
        return Err(ValidationReason::MissingPassword);
    }
    Ok(image)
}

/// Marks an email as having a registration in flight until dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightGuard {
    fn claim(set: &Arc<Mutex<HashSet<String>>>, email: &str) -> Option<Self> {
        let key = email.to_lowercase();
        let inserted = set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.clone());

        inserted.then(|| Self {
            set: set.clone(),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}
