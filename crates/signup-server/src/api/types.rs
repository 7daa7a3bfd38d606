//! API request and response types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub camera_started: bool,
}

/// Response after the camera stream is bound.
#[derive(Debug, Serialize)]
pub struct CameraStartedResponse {
    pub started: bool,
    pub width: u32,
    pub height: u32,
}

/// A captured photo, held as the pending signup photo.
#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`, ready for an `<img src>`
    pub data_url: String,
}

#[derive(Debug, Serialize)]
pub struct CameraReleasedResponse {
    pub released: bool,
}

/// Signup form submission.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default = "empty_secret")]
    pub password: SecretString,

    #[serde(default = "empty_secret")]
    pub confirm_password: SecretString,

    /// PNG data URL captured by the browser. Overrides the pending photo.
    pub photo: Option<String>,
}

/// Response after a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub profile_image_path: Option<String>,
    /// True when the account was created without a stored photo
    pub degraded: bool,
    pub message: String,
    pub redirect: String,
}

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default = "empty_secret")]
    pub password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub message: String,
    pub redirect: String,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}
