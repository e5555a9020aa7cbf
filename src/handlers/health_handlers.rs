//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks bucket configuration and the storage backend

use crate::services::upload_service::UploadContext;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Verifies a destination bucket is configured.
/// 2. Asks the storage backend to probe that bucket.
///
/// HTTP 200 when all checks pass, HTTP 503 when any check fails.
pub async fn readyz(State(ctx): State<UploadContext>) -> impl IntoResponse {
    let (bucket_check, storage_check) = match ctx.bucket.as_deref() {
        Some(bucket) => {
            let storage = match ctx.store.check(bucket).await {
                Ok(()) => CheckStatus::ok(),
                Err(e) => CheckStatus::failed(format!("error: {}", e)),
            };
            (CheckStatus::ok(), storage)
        }
        None => (
            CheckStatus::failed("bucket not configured".into()),
            CheckStatus::failed("skipped: no bucket".into()),
        ),
    };

    let overall_ok = bucket_check.ok && storage_check.ok;

    let mut checks = HashMap::new();
    checks.insert("bucket", bucket_check);
    checks.insert(ctx.store.name(), storage_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}
