//! Defines routes for serving the upload function over plain HTTP.
//!
//! ## Structure
//! - `POST /upload`  — store the request body as one object
//! - `GET  /healthz` — liveness
//! - `GET  /readyz`  — readiness (bucket configured, backend reachable)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::upload,
    },
    services::upload_service::UploadContext,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router.
///
/// The router carries shared state (`UploadContext`) to all handlers. Upload
/// bodies are not size-limited here; the hosting gateway owns that concern.
pub fn routes() -> Router<UploadContext> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/upload", post(upload).layer(DefaultBodyLimit::disable()))
}
