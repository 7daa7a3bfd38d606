//! Error types for the signup service.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use media_capture::CaptureError;
use registration::{AuthErrorCode, LoginError, RegistrationError, LOGIN_FAILED_MESSAGE};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Body was not valid JSON for the route, or exceeded the size limit.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Text the kiosk shows to the user
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Registration(e) => {
                let status = match e {
                    RegistrationError::Validation(_) => StatusCode::BAD_REQUEST,
                    RegistrationError::Auth(auth) => auth_status(auth.code),
                    RegistrationError::RecordPersistFailure { .. } => StatusCode::BAD_GATEWAY,
                    RegistrationError::AlreadyInProgress(_) => StatusCode::CONFLICT,
                };
                (status, e.code())
            }
            ApiError::Login(e) => {
                let status = match e {
                    LoginError::Validation(_) => StatusCode::BAD_REQUEST,
                    LoginError::Auth(auth) => auth_status(auth.code),
                };
                (status, e.code())
            }
            ApiError::Capture(e) => match e {
                CaptureError::DeviceUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "DEVICE_UNAVAILABLE")
                }
                CaptureError::NotReady => (StatusCode::CONFLICT, "CAMERA_NOT_READY"),
                CaptureError::InvalidDataUrl(_) => (StatusCode::BAD_REQUEST, "INVALID_PHOTO"),
                CaptureError::InvalidFrame(_) | CaptureError::Encoding(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CAPTURE_FAILED")
                }
            },
            ApiError::InvalidBody(rejection) => {
                let status = rejection.status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    (status, "PAYLOAD_TOO_LARGE")
                } else {
                    (status, "INVALID_REQUEST")
                }
            }
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        }
    }

    /// Human-readable message for the kiosk UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Registration(e) => e.user_message(),
            // Never reveal which of email or password was wrong
            ApiError::Login(_) => LOGIN_FAILED_MESSAGE,
            ApiError::Capture(e) => match e {
                CaptureError::DeviceUnavailable(_) => {
                    "Unable to access the camera. Please check your permissions."
                }
                CaptureError::NotReady => "Start the camera before capturing a photo.",
                CaptureError::InvalidDataUrl(_) => "The submitted photo could not be read.",
                CaptureError::InvalidFrame(_) | CaptureError::Encoding(_) => {
                    "Unable to capture a photo. Please try again."
                }
            },
            ApiError::InvalidBody(rejection) => {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    "The submitted photo is too large."
                } else {
                    "The request could not be read."
                }
            }
            ApiError::RateLimitExceeded => "Too many requests. Please wait and try again.",
        }
    }
}

fn auth_status(code: AuthErrorCode) -> StatusCode {
    match code {
        AuthErrorCode::EmailInUse => StatusCode::CONFLICT,
        AuthErrorCode::InvalidEmail | AuthErrorCode::WeakPassword => StatusCode::BAD_REQUEST,
        AuthErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthErrorCode::Unknown => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            message: self.user_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
