//! Represents the gateway-shaped reply to one invocation.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Message returned in every successful upload payload.
pub const SUCCESS_MESSAGE: &str = "File uploaded successfully!";

/// Outbound event: an HTTP status plus a JSON-encoded string body.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status_code: u16,
    pub body: String,
}

impl UploadResponse {
    /// `200` with `{message, bucket, key}`.
    pub fn success(bucket: &str, key: &str) -> Self {
        Self {
            status_code: 200,
            body: json!({
                "message": SUCCESS_MESSAGE,
                "bucket": bucket,
                "key": key,
            })
            .to_string(),
        }
    }

    /// `500` with `{error}`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: json!({ "error": message.into() }).to_string(),
        }
    }
}
