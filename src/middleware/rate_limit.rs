use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Fixed one-second window shared across all callers of the forum API.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_per_window: u32,
    window: Arc<Mutex<(Instant, u32)>>,
}

impl RateLimiter {
    fn new(max_per_window: u32) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window: Arc::new(Mutex::new((Instant::now(), 0))),
        }
    }

    fn check(&self) -> bool {
        let mut guard = self.window.lock().expect("rate limiter mutex poisoned");
        if guard.0.elapsed() >= Duration::from_secs(1) {
            *guard = (Instant::now(), 1);
            return true;
        }
        if guard.1 < self.max_per_window {
            guard.1 += 1;
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
    if !limiter.check() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}
