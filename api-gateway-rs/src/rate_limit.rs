// Rate limiting using an in-memory fixed window per client.
//
// Clients are keyed by the first `X-Forwarded-For` address, then the peer
// address, then a shared "anonymous" bucket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use config_rs::WindowLimit;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::ErrorResponse;

pub const GENERAL_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";
pub const CONCEPT_MAP_LIMIT_MESSAGE: &str = "Too many concept map requests, please try again later.";

// Expired windows are swept once the table grows past this
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Rejection produced when a client has used up its window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub message: &'static str,
    pub retry_after: Duration,
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        // Round up so clients never retry inside the window
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: self.message.to_string(),
            }),
        )
            .into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(secs.max(1)));
        response
    }
}

/// Fixed-window request counter shared by all connections
#[derive(Debug)]
pub struct RateLimiter {
    limit: WindowLimit,
    message: &'static str,
    windows: RwLock<HashMap<String, WindowState>>,
}

impl RateLimiter {
    pub fn new(limit: WindowLimit, message: &'static str) -> Self {
        Self {
            limit,
            message,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Limiter for every route
    pub fn general(limit: WindowLimit) -> Self {
        Self::new(limit, GENERAL_LIMIT_MESSAGE)
    }

    /// Limiter for concept map generation
    pub fn concept_map(limit: WindowLimit) -> Self {
        Self::new(limit, CONCEPT_MAP_LIMIT_MESSAGE)
    }

    /// Counts one request for `key`, rejecting it if the window is full
    pub async fn check(&self, key: &str) -> Result<(), RateLimitExceeded> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.limit.window;
            windows.retain(|_, state| now.duration_since(state.window_start) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.limit.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.limit.max_requests {
            let retry_after = self
                .limit
                .window
                .saturating_sub(now.duration_since(entry.window_start));
            tracing::warn!(
                client = %key,
                limit = self.limit.max_requests,
                window_secs = self.limit.window.as_secs(),
                "Rate limit exceeded"
            );
            return Err(RateLimitExceeded {
                message: self.message,
                retry_after,
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Requests counted for `key` in its current window
    pub async fn usage(&self, key: &str) -> u32 {
        let now = Instant::now();
        self.windows
            .read()
            .await
            .get(key)
            .filter(|state| now.duration_since(state.window_start) < self.limit.window)
            .map(|state| state.count)
            .unwrap_or(0)
    }
}

/// Identifies the client a request is counted against
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Middleware enforcing a [`RateLimiter`]
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    match limiter.check(&key).await {
        Ok(()) => next.run(req).await,
        Err(rejection) => rejection.into_response(),
    }
}
