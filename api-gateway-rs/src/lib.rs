use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::HeaderValue, request::Parts, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use concept_map_rs::{ConceptMap, ConceptMapPipeline, ConceptMapRequest};
use config_rs::RateLimitSettings;

pub mod error;
pub mod rate_limit;

pub use error::ApiError;
use rate_limit::RateLimiter;

/// Maximum accepted request body (100KB)
pub const MAX_PAYLOAD_SIZE: usize = 100 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// ISO-8601 UTC with millisecond precision
    pub timestamp: String,
    /// Seconds since the gateway was created
    pub uptime: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Core concept-map gateway state
pub struct ConceptMapGateway {
    pipeline: ConceptMapPipeline,
    general_limiter: Arc<RateLimiter>,
    concept_map_limiter: Arc<RateLimiter>,
    started_at: Instant,
}

impl ConceptMapGateway {
    pub fn new(pipeline: ConceptMapPipeline, limits: RateLimitSettings) -> Self {
        Self {
            pipeline,
            general_limiter: Arc::new(RateLimiter::general(limits.general)),
            concept_map_limiter: Arc::new(RateLimiter::concept_map(limits.concept_map)),
            started_at: Instant::now(),
        }
    }

    /// Create the Axum router with all routes and middleware
    pub fn create_router(self: Arc<Self>) -> Router {
        let generate_map = post(Self::generate_map_handler).layer(middleware::from_fn_with_state(
            self.concept_map_limiter.clone(),
            rate_limit::enforce,
        ));

        Router::new()
            .route("/api/health", get(Self::health_handler))
            .route("/api/generate-map", generate_map)
            .fallback(Self::unknown_endpoint)
            .layer(middleware::from_fn_with_state(
                self.general_limiter.clone(),
                rate_limit::enforce,
            ))
            .layer(RequestBodyLimitLayer::new(MAX_PAYLOAD_SIZE))
            .layer(localhost_cors())
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    async fn health_handler(State(state): State<Arc<Self>>) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "UP".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime: state.started_at.elapsed().as_secs_f64(),
        })
    }

    async fn generate_map_handler(
        State(state): State<Arc<Self>>,
        payload: Result<Json<ConceptMapRequest>, JsonRejection>,
    ) -> Result<Json<ConceptMap>, ApiError> {
        let Json(request) = payload?;
        let map = state.pipeline.generate_dependency_map(&request).await?;
        Ok(Json(map))
    }

    async fn unknown_endpoint() -> impl IntoResponse {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "unknown endpoint".to_string(),
            }),
        )
    }
}

/// Browser access is limited to origins served from localhost
fn localhost_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            origin
                .to_str()
                .map(|o| o.contains("localhost"))
                .unwrap_or(false)
        }))
        .allow_methods(Any)
        .allow_headers(Any)
}
