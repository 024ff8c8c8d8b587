//! Per-client fixed-window rate limiting.
//!
//! One limiter covers the whole API: at most `RATE_LIMIT_MAX` requests per
//! client within each `RATE_LIMIT_WINDOW_SECS` window. A client's window
//! opens with its first request and its count resets once the window ends.
//! Excess requests get a `429 Too Many Requests` with a `Retry-After`
//! header.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use kori_core::config::RateLimitConfig;

use crate::error::AppError;

/// Tracked clients above which expired windows are swept on insert.
const SWEEP_THRESHOLD: usize = 10_000;

// =============================================================================
// Client IP
// =============================================================================

/// Identify the client a request counts against.
///
/// Order: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the peer
/// address from `ConnectInfo`. Requests with none of these share a single
/// budget keyed by `0.0.0.0`.
pub fn client_ip<B>(req: &axum::http::Request<B>) -> IpAddr {
    let headers = req.headers();

    // Try X-Forwarded-For (first IP in the chain)
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    // Try X-Real-IP
    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

// =============================================================================
// Limiter
// =============================================================================

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Within budget.
    Allowed,
    /// Over budget until the current window ends.
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    /// Create a limiter with no tracked clients.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request from `client` at `now`.
    pub fn check(&self, client: IpAddr, now: Instant) -> Decision {
        let window_len = self.config.window;
        // A panic while holding the lock leaves the counters consistent
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() >= SWEEP_THRESHOLD && !windows.contains_key(&client) {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window_len);
        }

        let window = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(window.started) >= window_len {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.config.max_requests {
            let elapsed = now.saturating_duration_since(window.started);
            return Decision::Limited {
                retry_after: window_len.saturating_sub(elapsed),
            };
        }

        window.count += 1;
        Decision::Allowed
    }
}

/// Create the API rate limiter.
#[must_use]
pub fn rate_limiter(config: &RateLimitConfig) -> RateLimiter {
    RateLimiter::new(*config)
}

/// Reject requests over the client's budget for the current window.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);

    match limiter.check(client, Instant::now()) {
        Decision::Allowed => next.run(request).await,
        Decision::Limited { retry_after } => {
            tracing::debug!(client = %client, "Rate limit exceeded");

            let mut response =
                AppError::with_status(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests")
                    .into_response();
            // Round up so clients never retry before the window ends
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}
