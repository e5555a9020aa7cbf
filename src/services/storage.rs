//! Storage collaborator abstraction.
//!
//! The upload handler only needs a single put-object operation; backends
//! implement [`ObjectStore`] and are shared as `Arc<dyn ObjectStore>`.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// What the backend reports back after a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Entity tag without surrounding quotes, when the backend returns one.
    pub etag: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `key` in `bucket`, replacing any existing object.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes)
    -> StorageResult<PutObjectOutput>;

    /// Cheap reachability probe used by the readiness endpoint.
    async fn check(&self, bucket: &str) -> StorageResult<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
