use crate::{config::BUCKET_ENV, models::response::UploadResponse, services::storage::StorageError};
use thiserror::Error;

/// Every way a single upload invocation can fail.
///
/// All variants surface the same way: a 500 response whose `error` field
/// carries the display text.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{} environment variable not set.", BUCKET_ENV)]
    MissingBucket,
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
    #[error("request body is missing")]
    MissingBody,
    #[error("invalid base64 body: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for UploadResponse {
    fn from(err: UploadError) -> Self {
        UploadResponse::error(err.to_string())
    }
}
