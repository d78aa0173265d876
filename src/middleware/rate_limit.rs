use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
}

/// Fixed one-second window shared by every route the layer wraps.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    scope: &'static str,
    rps: u32,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(scope: &'static str, rps: u32) -> Self {
        Self {
            scope,
            rps: rps.max(1),
            window: Arc::new(Mutex::new(Window {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if now.duration_since(window.start) >= Duration::from_secs(1) {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.allow() {
        tracing::warn!(scope = limiter.scope, rps = limiter.rps, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(scope: &'static str, rps: u32) -> RateLimiter {
    RateLimiter::new(scope, rps)
}
