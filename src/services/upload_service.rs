//! src/services/upload_service.rs
//!
//! The upload handler: decode the request body, derive a filename from
//! `content-disposition`, build a timestamped key, write one object, and turn
//! the outcome into a gateway response. Failures never escape an invocation;
//! they are logged and mapped to a 500 response in one place.

use crate::{
    errors::UploadError,
    models::{event::UploadEvent, response::UploadResponse},
    services::storage::ObjectStore,
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{error, info};

/// Filename used when the request does not name one.
pub const DEFAULT_FILENAME: &str = "default_filename.txt";

const KEY_PREFIX: &str = "uploads/";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const CONTENT_DISPOSITION: &str = "content-disposition";
const FILENAME_PARAM: &str = "filename=";

/// How the request body is turned into object bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DecodePolicy {
    /// Base64-decode only when the event sets `isBase64Encoded`; otherwise
    /// store the UTF-8 bytes of the body.
    #[default]
    FlagAware,
    /// Always base64-decode the body, ignoring the flag.
    AlwaysBase64,
}

impl fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodePolicy::FlagAware => f.write_str("flag-aware"),
            DecodePolicy::AlwaysBase64 => f.write_str("always-base64"),
        }
    }
}

/// Where and how a successful upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub etag: Option<String>,
}

/// Read-only dependencies shared by every invocation: built once at startup.
#[derive(Clone)]
pub struct UploadContext {
    pub store: Arc<dyn ObjectStore>,
    /// Destination bucket; `None` makes every invocation fail.
    pub bucket: Option<String>,
    pub decode_policy: DecodePolicy,
}

impl UploadContext {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: Option<String>,
        decode_policy: DecodePolicy,
    ) -> Self {
        Self {
            store,
            bucket,
            decode_policy,
        }
    }

    /// Handle a raw JSON payload. A payload that does not match the event
    /// shape becomes an error response like any other failure.
    pub async fn handle_payload(&self, payload: Value) -> UploadResponse {
        match serde_json::from_value::<UploadEvent>(payload) {
            Ok(event) => self.handle(&event).await,
            Err(err) => respond(Err(UploadError::from(err))),
        }
    }

    /// Handle one event using the current time.
    pub async fn handle(&self, event: &UploadEvent) -> UploadResponse {
        self.handle_at(event, Utc::now()).await
    }

    /// Handle one event as if invoked at `now`.
    pub async fn handle_at(&self, event: &UploadEvent, now: DateTime<Utc>) -> UploadResponse {
        respond(self.upload(event, now).await)
    }

    /// Run the upload and report the outcome without building a response.
    ///
    /// Performs exactly one storage write on success and none on failure.
    pub async fn upload(
        &self,
        event: &UploadEvent,
        now: DateTime<Utc>,
    ) -> Result<UploadReceipt, UploadError> {
        let bucket = self.bucket.as_deref().ok_or(UploadError::MissingBucket)?;
        let content = decode_body(event, self.decode_policy)?;
        let filename = filename_from_disposition(event.header(CONTENT_DISPOSITION));
        let key = storage_key(now, &filename);

        let size = content.len();
        let output = self.store.put_object(bucket, &key, content).await?;
        let receipt = UploadReceipt {
            bucket: bucket.to_string(),
            key,
            etag: output.etag,
        };
        info!(
            backend = self.store.name(),
            bucket = %receipt.bucket,
            key = %receipt.key,
            size,
            etag = ?receipt.etag,
            "stored upload"
        );

        Ok(receipt)
    }
}

fn respond(result: Result<UploadReceipt, UploadError>) -> UploadResponse {
    match result {
        Ok(receipt) => UploadResponse::success(&receipt.bucket, &receipt.key),
        Err(err) => {
            error!("Error: {}", err);
            err.into()
        }
    }
}

/// Turn the event body into the bytes to store.
pub fn decode_body(event: &UploadEvent, policy: DecodePolicy) -> Result<Bytes, UploadError> {
    let body = event.body.as_deref().ok_or(UploadError::MissingBody)?;
    let is_base64 = match policy {
        DecodePolicy::FlagAware => event.is_base64_encoded,
        DecodePolicy::AlwaysBase64 => true,
    };

    if is_base64 {
        Ok(Bytes::from(general_purpose::STANDARD.decode(body)?))
    } else {
        Ok(Bytes::copy_from_slice(body.as_bytes()))
    }
}

/// Pull the `filename=` parameter out of a `content-disposition` value.
///
/// Deliberately simple: the header is split on `;`, the first part containing
/// `filename=` wins, its value is whitespace-trimmed and one layer of double
/// quotes is removed from each end. `filename*=` and parameter-name case
/// variants are not recognised. A missing or empty value falls back to
/// [`DEFAULT_FILENAME`].
pub fn filename_from_disposition(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(';').find(|part| part.contains(FILENAME_PARAM)))
        .and_then(|part| part.split_once(FILENAME_PARAM))
        .map(|(_, value)| strip_quotes(value.trim()))
        .filter(|name| !name.is_empty())
        .map_or_else(|| DEFAULT_FILENAME.to_string(), str::to_string)
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// `uploads/<YYYY-MM-DD-HH-MM-SS>-<filename>` in UTC.
pub fn storage_key(now: DateTime<Utc>, filename: &str) -> String {
    format!("{}{}-{}", KEY_PREFIX, now.format(TIMESTAMP_FORMAT), filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::testing::MemoryObjectStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap()
    }

    fn context(store: Arc<MemoryObjectStore>, bucket: Option<&str>) -> UploadContext {
        UploadContext::new(store, bucket.map(String::from), DecodePolicy::FlagAware)
    }

    fn event(body: &str, base64: bool, disposition: Option<&str>) -> UploadEvent {
        let mut event = UploadEvent {
            body: Some(body.to_string()),
            is_base64_encoded: base64,
            ..Default::default()
        };
        if let Some(value) = disposition {
            event
                .headers
                .insert(CONTENT_DISPOSITION.to_string(), value.to_string());
        }
        event
    }

    fn parse(resp: &UploadResponse) -> Value {
        serde_json::from_str(&resp.body).unwrap()
    }

    #[test]
    fn test_filename_quotes_are_stripped() {
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"report.pdf\"")),
            "report.pdf"
        );
        assert_eq!(
            filename_from_disposition(Some("form-data; name=\"file\"; filename=notes.txt")),
            "notes.txt"
        );
    }

    #[test]
    fn test_filename_defaults() {
        assert_eq!(filename_from_disposition(None), DEFAULT_FILENAME);
        assert_eq!(filename_from_disposition(Some("inline")), DEFAULT_FILENAME);
    }

    #[test]
    fn test_empty_filename_uses_default_instead_of_empty_key_suffix() {
        // an empty parameter does not yield `uploads/<ts>-`
        for header in ["attachment; filename=\"\"", "attachment; filename=", "filename=  "] {
            assert_eq!(filename_from_disposition(Some(header)), DEFAULT_FILENAME);
        }
        let key = storage_key(instant(), &filename_from_disposition(Some("filename=")));
        assert_eq!(key, "uploads/2024-03-07-09-05-02-default_filename.txt");
    }

    #[test]
    fn test_filename_parser_is_simplified() {
        // first matching part wins
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=a.txt; filename=b.txt")),
            "a.txt"
        );
        // only one layer of quotes is removed
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"\"x\"\"")),
            "\"x\""
        );
        // extended parameters and other cases are not understood
        assert_eq!(
            filename_from_disposition(Some("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf")),
            DEFAULT_FILENAME
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; FILENAME=upper.txt")),
            DEFAULT_FILENAME
        );
        // the value runs to the end of the part; later `=` are kept, not cut at
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"a=b.txt\"")),
            "a=b.txt"
        );
        // no sanitization beyond quotes
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"dir/a=b.txt\"")),
            "dir/a=b.txt"
        );
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            storage_key(instant(), "report.pdf"),
            "uploads/2024-03-07-09-05-02-report.pdf"
        );
    }

    #[test]
    fn test_decode_flag_aware() {
        let decoded = decode_body(&event("SGVsbG8=", true, None), DecodePolicy::FlagAware).unwrap();
        assert_eq!(&decoded[..], b"Hello");

        let raw = decode_body(&event("Hello", false, None), DecodePolicy::FlagAware).unwrap();
        assert_eq!(&raw[..], b"Hello");

        // flag false keeps base64-looking text verbatim
        let verbatim =
            decode_body(&event("SGVsbG8=", false, None), DecodePolicy::FlagAware).unwrap();
        assert_eq!(&verbatim[..], b"SGVsbG8=");
    }

    #[test]
    fn test_decode_always_base64() {
        let decoded =
            decode_body(&event("SGVsbG8=", false, None), DecodePolicy::AlwaysBase64).unwrap();
        assert_eq!(&decoded[..], b"Hello");

        let err = decode_body(&event("Hello", false, None), DecodePolicy::AlwaysBase64);
        assert!(matches!(err, Err(UploadError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_body() {
        let err = decode_body(&UploadEvent::default(), DecodePolicy::FlagAware);
        assert!(matches!(err, Err(UploadError::MissingBody)));
    }

    #[tokio::test]
    async fn test_successful_upload_writes_once() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), Some("my-bucket"));

        let resp = ctx
            .handle_at(
                &event("SGVsbG8=", true, Some("attachment; filename=\"report.pdf\"")),
                instant(),
            )
            .await;

        assert_eq!(resp.status_code, 200);
        let body = parse(&resp);
        assert_eq!(body["message"], "File uploaded successfully!");
        assert_eq!(body["bucket"], "my-bucket");
        assert_eq!(body["key"], "uploads/2024-03-07-09-05-02-report.pdf");

        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].bucket, "my-bucket");
        assert_eq!(puts[0].key, "uploads/2024-03-07-09-05-02-report.pdf");
        assert_eq!(&puts[0].body[..], b"Hello");
    }

    #[tokio::test]
    async fn test_default_filename_in_key() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), Some("my-bucket"));

        let receipt = ctx.upload(&event("Hello", false, None), instant()).await.unwrap();
        assert_eq!(receipt.key, "uploads/2024-03-07-09-05-02-default_filename.txt");
        assert!(receipt.etag.is_some());
    }

    #[tokio::test]
    async fn test_missing_bucket_performs_no_write() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), None);

        let resp = ctx.handle(&event("SGVsbG8=", true, None)).await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(
            parse(&resp)["error"],
            "UPLOAD_BUCKET_NAME environment variable not set."
        );
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_becomes_500() {
        let store = Arc::new(MemoryObjectStore::failing("AccessDenied: no write permission"));
        let ctx = context(store.clone(), Some("my-bucket"));

        let resp = ctx.handle(&event("Hello", false, None)).await;

        assert_eq!(resp.status_code, 500);
        let error = parse(&resp)["error"].as_str().unwrap().to_string();
        assert!(error.contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_decode_failure_performs_no_write() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), Some("my-bucket"));

        let resp = ctx.handle(&event("not base64!", true, None)).await;

        assert_eq!(resp.status_code, 500);
        assert!(parse(&resp)["error"].as_str().unwrap().starts_with("invalid base64 body"));
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_becomes_500() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), Some("my-bucket"));

        for payload in [json!("just a string"), json!({ "body": ["x"] }), json!({})] {
            let resp = ctx.handle_payload(payload).await;
            assert_eq!(resp.status_code, 500);
            assert!(!parse(&resp)["error"].as_str().unwrap().is_empty());
        }
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_handle_payload_success() {
        let store = Arc::new(MemoryObjectStore::new());
        let ctx = context(store.clone(), Some("my-bucket"));

        let resp = ctx
            .handle_payload(json!({
                "body": "SGVsbG8=",
                "isBase64Encoded": true,
                "headers": { "content-disposition": "attachment; filename=\"hi.txt\"" }
            }))
            .await;

        assert_eq!(resp.status_code, 200);
        let key = parse(&resp)["key"].as_str().unwrap().to_string();
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with("-hi.txt"));
        assert_eq!(store.puts()[0].key, key);
    }

    #[test]
    fn test_decode_policy_display_matches_cli_values() {
        for policy in [DecodePolicy::FlagAware, DecodePolicy::AlwaysBase64] {
            assert_eq!(
                DecodePolicy::from_str(&policy.to_string(), false).unwrap(),
                policy
            );
        }
    }
}
