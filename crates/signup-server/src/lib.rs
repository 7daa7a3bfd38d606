//! Kiosk signup service.
//!
//! Serves the camera and signup endpoints used by the attendance kiosk UI:
//! - Start, capture from, and release the local camera
//! - Register a new user with the captured photo
//! - Sign existing users in

pub mod api;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::ApiError;
