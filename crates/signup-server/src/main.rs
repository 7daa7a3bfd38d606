//! Kiosk signup service - Entry point.

use backend_client::Backend;
use media_capture::{MediaCapture, StillImageDevice};
use registration::{LoginService, RegistrationOrchestrator};
use signup_server::{
    api::{create_router, AppState, RateLimitState},
    config::Config,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let json = config.log.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    info!("Starting kiosk signup service");

    // Backend clients share one HTTP connection pool
    let backend = match Backend::connect(&config.backend) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to configure backend: {}", e);
            std::process::exit(1);
        }
    };

    let device = StillImageDevice::new(&config.camera.source_path);
    let capture = Arc::new(MediaCapture::new(Arc::new(device)));
    info!(device = %capture.device_name(), "Camera configured");

    let orchestrator = RegistrationOrchestrator::new(
        backend.auth.clone(),
        backend.storage.clone(),
        backend.database.clone(),
    );
    let login = LoginService::new(backend.auth.clone());

    let state = AppState::new(
        orchestrator,
        login,
        capture.clone(),
        config.server.landing_path.clone(),
    );
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router(state, rate_limit);

    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if capture.release().await {
        info!("Camera released on shutdown");
    }

    if let Err(e) = result {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
