//! Kiosk request throttling and access logging.

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, error, warn};

type KioskLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One shared budget for the whole kiosk. There is a single physical
/// terminal, so requests are not keyed by client address.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<KioskLimiter>,
    per_minute: NonZeroU32,
}

impl RateLimitState {
    /// Allow `requests_per_minute` across all throttled routes. Zero is treated as one.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            per_minute,
        }
    }

    /// A budget large enough that tests never hit it.
    pub fn permissive() -> Self {
        Self::new(1000)
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute.get()
    }

    /// Spend one request from the budget.
    pub fn admit(&self) -> Result<(), ApiError> {
        self.limiter.check().map_err(|_| {
            warn!(per_minute = self.per_minute(), "Kiosk request budget spent");
            ApiError::RateLimitExceeded
        })
    }
}

pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    rate_limit.admit()?;
    Ok(next.run(request).await)
}

/// Logs each request by outcome. Health checks stay quiet unless they fail.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let quiet = path == "/health";
    let started = Instant::now();

    if !quiet {
        debug!(%method, %path, "Request started");
    }

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        error!(%method, %path, status = status.as_u16(), latency_ms, "Request errored");
    } else if status.is_client_error() {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "Request rejected");
    } else if !quiet {
        debug!(%method, %path, status = status.as_u16(), latency_ms, "Request served");
    }

    response
}
