//! HTTP adapter for the upload handler.
//! Converts a raw axum request into the gateway event shape and the handler's
//! response back into an HTTP reply, so local serving and Lambda share one
//! code path.

use crate::{
    models::{event::UploadEvent, response::UploadResponse},
    services::upload_service::UploadContext,
};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose};

/// `POST /upload`
pub async fn upload(
    State(ctx): State<UploadContext>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let event = event_from_request(&headers, &body);
    ctx.handle(&event).await
}

/// Build the event an HTTP API gateway would produce for a binary body:
/// base64 body, `isBase64Encoded` set, lower-cased header names. Headers that
/// are not valid UTF-8 are skipped; repeated headers keep the last value.
pub fn event_from_request(headers: &HeaderMap, body: &[u8]) -> UploadEvent {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    UploadEvent {
        body: Some(general_purpose::STANDARD.encode(body)),
        is_base64_encoded: true,
        headers,
    }
}

impl IntoResponse for UploadResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
