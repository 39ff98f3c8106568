//! Doc2md Server Library
//!
//! A thin HTTP glue service that turns uploaded documents into Markdown by
//! delegating to external conversion tooling. This library exposes the
//! modules and router for testing; the binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod converter;
pub mod error;
pub mod state;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use state::AppState;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HelloResponse {
    message: String,
    status: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Build the application router around shared state.
///
/// The axum body limit is raised above the configured maximum so that the
/// handler's own size check decides the 413, with a little slack for
/// multipart framing overhead.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .limits
        .max_file_size
        .saturating_add(1024 * 1024);

    Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        // Conversion API
        .route("/convert", post(api::convert::convert))
        .route("/convert-base64", post(api::convert::convert_base64))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "doc2md: document to Markdown conversion service".to_string(),
        status: "ok".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Service is healthy".to_string(),
    })
}
