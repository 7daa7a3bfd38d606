//! Integration tests for the kiosk API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use backend_client::{Backend, BackendConfig};
use media_capture::{mock::MockDevice, CapturedImage, Frame, MediaCapture};
use registration::{LoginService, RegistrationOrchestrator};
use secrecy::SecretString;
use signup_server::api::{create_router, AppState, RateLimitState};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "attendance.appspot.com";

/// Create a test app state against a mock backend.
fn create_test_state(mock_server: &MockServer, device: MockDevice) -> AppState {
    let config = BackendConfig {
        api_key: SecretString::new("test-api-key".into()),
        project_id: "attendance".into(),
        database_url: mock_server.uri(),
        storage_bucket: BUCKET.into(),
        auth_url: mock_server.uri(),
        storage_url: mock_server.uri(),
        timeout: Duration::from_secs(5),
    };
    let backend = Backend::connect(&config).unwrap();

    AppState::new(
        RegistrationOrchestrator::new(
            backend.auth.clone(),
            backend.storage.clone(),
            backend.database.clone(),
        ),
        LoginService::new(backend.auth.clone()),
        Arc::new(MediaCapture::new(Arc::new(device))),
        "/Usersurface",
    )
}

fn test_device() -> MockDevice {
    MockDevice::new(Frame::solid(32, 24, [10, 20, 30, 255]))
}

fn create_test_app(mock_server: &MockServer, device: MockDevice) -> Router {
    create_router(
        create_test_state(mock_server, device),
        RateLimitState::permissive(),
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn signup_form() -> serde_json::Value {
    serde_json::json!({
        "email": "a@x.com",
        "password": "secret1",
        "confirm_password": "secret1"
    })
}

async fn mount_sign_up(mock_server: &MockServer, user_id: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "localId": user_id,
            "email": "a@x.com",
            "idToken": "token-123"
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn mount_upload(mock_server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!("/v0/b/{}/o", BUCKET)))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "name": "profileImages/u1"
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn mount_record(mock_server: &MockServer, status: u16) {
    Mock::given(method("PUT"))
        .and(path("/users/u1.json"))
        .and(query_param("auth", "token-123"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["camera_started"], false);
}

#[tokio::test]
async fn test_capture_before_start_is_not_ready() {
    let mock_server = MockServer::start().await;
    let device = test_device();
    let app = create_test_app(&mock_server, device.clone());

    let (status, json) = send(&app, "POST", "/v1/camera/capture", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CAMERA_NOT_READY");
    assert_eq!(device.samples(), 0);
}

#[tokio::test]
async fn test_start_and_capture() {
    let mock_server = MockServer::start().await;
    let device = test_device();
    let app = create_test_app(&mock_server, device.clone());

    let (status, json) = send(&app, "POST", "/v1/camera/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 32);
    assert_eq!(json["height"], 24);

    // Second start is a no-op
    let (status, _) = send(&app, "POST", "/v1/camera/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(device.acquired(), 1);

    let (status, json) = send(&app, "POST", "/v1/camera/capture", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 32);
    assert!(json["data_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let (_, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(json["camera_started"], true);
}

#[tokio::test]
async fn test_start_with_denied_permission() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, MockDevice::denied());

    let (status, json) = send(&app, "POST", "/v1/camera/start", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "DEVICE_UNAVAILABLE");
    assert_eq!(
        json["message"],
        "Unable to access the camera. Please check your permissions."
    );
}

#[tokio::test]
async fn test_release_camera() {
    let mock_server = MockServer::start().await;
    let device = test_device();
    let app = create_test_app(&mock_server, device.clone());

    send(&app, "POST", "/v1/camera/start", None).await;
    let (status, json) = send(&app, "DELETE", "/v1/camera", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["released"], true);
    assert_eq!(device.released(), 1);

    let (_, json) = send(&app, "DELETE", "/v1/camera", None).await;
    assert_eq!(json["released"], false);
}

#[tokio::test]
async fn test_register_without_photo() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MISSING_PHOTO");
    assert_eq!(json["message"], "Please capture a photo before proceeding.");

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let form = serde_json::json!({
        "email": "a@x.com",
        "password": "secret1",
        "confirm_password": "secret2"
    });
    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PASSWORD_MISMATCH");
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_full_flow() {
    let mock_server = MockServer::start().await;
    mount_sign_up(&mock_server, "u1").await;
    mount_upload(&mock_server, 200).await;
    mount_record(&mock_server, 200).await;

    let app = create_test_app(&mock_server, test_device());
    send(&app, "POST", "/v1/camera/start", None).await;
    send(&app, "POST", "/v1/camera/capture", None).await;

    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user_id"], "u1");
    assert_eq!(json["profile_image_path"], "profileImages/u1");
    assert_eq!(json["degraded"], false);
    assert_eq!(json["redirect"], "/Usersurface");

    let put = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.to_string() == "PUT")
        .unwrap();
    let record: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(
        record,
        serde_json::json!({"email": "a@x.com", "profileImagePath": "profileImages/u1"})
    );

    // Pending photo is consumed by a successful registration
    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MISSING_PHOTO");
}

#[tokio::test]
async fn test_register_with_submitted_photo() {
    let mock_server = MockServer::start().await;
    mount_sign_up(&mock_server, "u1").await;
    mount_upload(&mock_server, 200).await;
    mount_record(&mock_server, 200).await;

    let app = create_test_app(&mock_server, test_device());
    let photo = CapturedImage::encode(&Frame::solid(4, 4, [1, 2, 3, 255])).unwrap();

    let mut form = signup_form();
    form["photo"] = serde_json::Value::String(photo.to_data_url());

    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user_id"], "u1");
}

#[tokio::test]
async fn test_register_with_unreadable_photo() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let mut form = signup_form();
    form["photo"] = serde_json::Value::String("data:image/png;base64,!!!".into());

    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_PHOTO");
}

#[tokio::test]
async fn test_register_email_in_use() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "EMAIL_EXISTS"}
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server, test_device());
    send(&app, "POST", "/v1/camera/start", None).await;
    send(&app, "POST", "/v1/camera/capture", None).await;

    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "EMAIL_IN_USE");
    assert_eq!(json["message"], "The email address is already in use.");

    // Nothing was uploaded or written
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_register_degraded_when_upload_fails() {
    let mock_server = MockServer::start().await;
    mount_sign_up(&mock_server, "u1").await;
    mount_upload(&mock_server, 503).await;
    mount_record(&mock_server, 200).await;

    let app = create_test_app(&mock_server, test_device());
    send(&app, "POST", "/v1/camera/start", None).await;
    send(&app, "POST", "/v1/camera/capture", None).await;

    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["degraded"], true);
    assert!(json["profile_image_path"].is_null());
}

#[tokio::test]
async fn test_register_record_failure() {
    let mock_server = MockServer::start().await;
    mount_sign_up(&mock_server, "u1").await;
    mount_upload(&mock_server, 200).await;
    mount_record(&mock_server, 401).await;

    let app = create_test_app(&mock_server, test_device());
    send(&app, "POST", "/v1/camera/start", None).await;
    send(&app, "POST", "/v1/camera/capture", None).await;

    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "RECORD_PERSIST_FAILURE");
}

#[tokio::test]
async fn test_login_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "localId": "u1",
            "email": "a@x.com",
            "idToken": "token-123"
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server, test_device());
    let form = serde_json::json!({"email": "a@x.com", "password": "secret1"});

    let (status, json) = send(&app, "POST", "/v1/login", Some(form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], "u1");
    assert_eq!(json["redirect"], "/Usersurface");
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "EMAIL_NOT_FOUND"}
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server, test_device());
    let form = serde_json::json!({"email": "nobody@x.com", "password": "secret1"});

    let (status, json) = send(&app, "POST", "/v1/login", Some(form)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert_eq!(
        json["message"],
        "Incorrect email or password. Please try again."
    );
}

#[tokio::test]
async fn test_rate_limiting() {
    let mock_server = MockServer::start().await;
    let state = create_test_state(&mock_server, test_device());
    // Very restrictive rate limit: 1 request per minute
    let app = create_router(state, RateLimitState::new(1));

    let (status, _) = send(&app, "POST", "/v1/camera/start", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "POST", "/v1/camera/capture", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");

    // Health checks bypass the limiter
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

/// Pseudo-random pixels, so the PNG stays about as large as a real camera frame.
fn noisy_frame(width: u32, height: u32) -> Frame {
    let mut seed: u32 = 0x9e37_79b9;
    let pixels = (0..width as usize * height as usize * 4)
        .map(|_| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 24) as u8
        })
        .collect();
    Frame::new(width, height, pixels).unwrap()
}

#[tokio::test]
async fn test_register_accepts_full_resolution_photo() {
    let mock_server = MockServer::start().await;
    mount_sign_up(&mock_server, "u1").await;
    mount_upload(&mock_server, 200).await;
    mount_record(&mock_server, 200).await;

    let app = create_test_app(&mock_server, test_device());
    let photo = CapturedImage::encode(&noisy_frame(1280, 720)).unwrap();
    let data_url = photo.to_data_url();
    // Well past the extractor's 2 MB default
    assert!(data_url.len() > 4 * 1024 * 1024);

    let mut form = signup_form();
    form["photo"] = serde_json::Value::String(data_url);

    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user_id"], "u1");
    assert_eq!(json["degraded"], false);
}

#[tokio::test]
async fn test_register_oversized_body_is_json_error() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let mut form = signup_form();
    form["photo"] = serde_json::Value::String("A".repeat(17 * 1024 * 1024));

    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["message"], "The submitted photo is too large.");
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_malformed_body_is_json_error() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/register")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_register_mismatch_reported_before_unreadable_photo() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());

    let form = serde_json::json!({
        "email": "a@x.com",
        "password": "secret1",
        "confirm_password": "secret2",
        "photo": "data:image/png;base64,!!!"
    });
    let (status, json) = send(&app, "POST", "/v1/register", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PASSWORD_MISMATCH");
}

#[tokio::test]
async fn test_photo_captured_during_registration_is_kept() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "localId": "u1",
                    "email": "a@x.com",
                    "idToken": "token-123"
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/v0/b/{}/o", BUCKET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "profileImages/u1"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server, test_device());
    send(&app, "POST", "/v1/camera/start", None).await;
    send(&app, "POST", "/v1/camera/capture", None).await;

    let in_flight = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, "POST", "/v1/register", Some(signup_form())).await })
    };

    // Recapture while account creation is still waiting on the backend
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (status, _) = send(&app, "POST", "/v1/camera/capture", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = in_flight.await.unwrap();
    assert_eq!(status, StatusCode::CREATED);

    // The newer photo was not consumed by the earlier registration
    let (status, json) = send(&app, "POST", "/v1/register", Some(signup_form())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
}

#[tokio::test]
async fn test_login_empty_password_is_rejected_locally() {
    let mock_server = MockServer::start().await;
    let app = create_test_app(&mock_server, test_device());
    let form = serde_json::json!({"email": "a@x.com", "password": ""});

    let (status, json) = send(&app, "POST", "/v1/login", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MISSING_PASSWORD");
    assert_eq!(
        json["message"],
        "Incorrect email or password. Please try again."
    );
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
