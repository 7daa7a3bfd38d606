//! HTTP request handlers.

use super::types::{
    CameraReleasedResponse, CameraStartedResponse, HealthResponse, LoginRequest, LoginResponse,
    PhotoResponse, RegisterRequest, RegisterResponse,
};
use super::AppState;
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use media_capture::CapturedImage;
use registration::{RegistrationError, RegistrationRequest, ValidationReason};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        camera_started: state.capture.is_started().await,
    })
}

/// Bind the camera stream. Calling again while started is a no-op.
pub async fn start_camera(
    State(state): State<AppState>,
) -> Result<Json<CameraStartedResponse>, ApiError> {
    let info = state.capture.start_camera().await?;

    Ok(Json(CameraStartedResponse {
        started: true,
        width: info.width,
        height: info.height,
    }))
}

/// Grab the current frame and keep it as the pending signup photo.
pub async fn capture_photo(
    State(state): State<AppState>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let image = state.capture.capture_photo().await?;

    let response = PhotoResponse {
        width: image.width(),
        height: image.height(),
        data_url: image.to_data_url(),
    };
    *state.pending_photo.lock().await = Some(image);

    Ok(Json(response))
}

/// Release the camera and discard any pending photo.
pub async fn release_camera(State(state): State<AppState>) -> Json<CameraReleasedResponse> {
    let released = state.capture.release().await;
    state.pending_photo.lock().await.take();

    if released {
        info!("Camera released");
    }

    Json(CameraReleasedResponse { released })
}

/// Register a new user with the submitted or pending photo.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;

    let mut form = RegistrationRequest::new(
        request.email,
        request.password.expose_secret().as_str(),
        request.confirm_password.expose_secret().as_str(),
        None,
    );

    // Remembered so a photo captured while this request is in flight survives it
    let (pending_photo, pending_taken_at) = {
        let pending = state.pending_photo.lock().await;
        let photo = if request.photo.is_some() {
            None
        } else {
            pending.clone()
        };
        (photo, pending.as_ref().map(CapturedImage::captured_at))
    };

    let captured_image = match request.photo.as_deref() {
        Some(data_url) => match CapturedImage::from_data_url(data_url) {
            Ok(image) => Some(image),
            // An unreadable photo ranks where a missing one would
            Err(_) if !form.passwords_match() => {
                return Err(
                    RegistrationError::Validation(ValidationReason::PasswordMismatch).into(),
                );
            }
            Err(e) => return Err(e.into()),
        },
        None => pending_photo,
    };
    form.captured_image = captured_image;

    let outcome = state.orchestrator.register(form).await?;

    {
        let mut pending = state.pending_photo.lock().await;
        if pending.as_ref().map(CapturedImage::captured_at) == pending_taken_at {
            pending.take();
        } else {
            debug!("Newer photo captured during registration, keeping it");
        }
    }

    let degraded = outcome.is_degraded();
    let message = if degraded {
        warn!(user_id = %outcome.user_id, "Registered without a profile photo");
        "Registration successful, but your photo could not be saved."
    } else {
        "Registration successful."
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: outcome.user_id,
            profile_image_path: outcome.profile_image_path,
            degraded,
            message: message.to_string(),
            redirect: state.landing_path.clone(),
        }),
    ))
}

/// Sign in an existing user.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let identity = state
        .login
        .login(&request.email, request.password.expose_secret())
        .await?;

    Ok(Json(LoginResponse {
        user_id: identity.user_id,
        email: identity.email,
        message: "Login successful.".to_string(),
        redirect: state.landing_path.clone(),
    }))
}
