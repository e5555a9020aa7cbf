//! Amazon S3 backend built on `aws-sdk-s3`.

use crate::services::storage::{ObjectStore, PutObjectOutput, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::debug;

/// S3 storage backend. The client is created once and reused across
/// invocations.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS credential and region chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> StorageResult<PutObjectOutput> {
        let size = body.len();
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::Backend(DisplayErrorContext(&err).to_string()))?;

        debug!("put s3://{}/{} ({} bytes)", bucket, key, size);

        Ok(PutObjectOutput {
            etag: output.e_tag().map(|tag| tag.trim_matches('"').to_string()),
        })
    }

    async fn check(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| StorageError::Backend(DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
