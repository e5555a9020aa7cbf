//! src/services/local_store.rs
//!
//! LocalObjectStore — a filesystem-backed stand-in for the cloud bucket, used
//! for local development and self-hosted deployments. Objects are laid out as
//! `base_path/{bucket}/{key}` so the tree mirrors the bucket's key space.

use crate::services::storage::{ObjectStore, PutObjectOutput, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    /// Base directory on disk where bucket directories live.
    pub base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Rejects keys that are empty, too long, carry control characters or
    /// backslashes, or have an empty, `.` or `..` path segment.
    fn ensure_key_safe(&self, key: &str) -> StorageResult<()> {
        let invalid = || Err(StorageError::InvalidObjectKey(key.to_string()));
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return invalid();
        }
        if key
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return invalid();
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return invalid();
        }
        Ok(())
    }

    /// Validate bucket name format.
    ///
    /// Enforces S3-like naming rules:
    /// - 3–63 characters
    /// - lowercase letters, digits, dots, hyphens only
    /// - cannot start/end with dot or hyphen
    /// - cannot contain consecutive dots or dot-hyphen patterns
    /// - cannot look like an IPv4 address
    fn ensure_bucket_name_safe(&self, name: &str) -> StorageResult<()> {
        let invalid = |reason: &str| {
            Err(StorageError::InvalidBucketName {
                name: name.to_string(),
                reason: reason.into(),
            })
        };

        let len = name.len();
        if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
            return invalid("must be between 3 and 63 characters");
        }

        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return invalid("allowed characters are lowercase letters, digits, dots, and hyphens");
        }

        if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
            return invalid("must start and end with a lowercase letter or digit");
        }

        if name.contains("..") || name.contains("-.") || name.contains(".-") {
            return invalid("cannot contain consecutive dots or dot-hyphen combinations");
        }

        if is_ipv4_like(name) {
            return invalid("must not be formatted like an IP address");
        }

        Ok(())
    }

    fn bucket_root(&self, bucket: &str) -> PathBuf {
        self.base_path.join(bucket)
    }

    /// Fully-qualified payload path; parent directories may not exist yet.
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.bucket_root(bucket);
        path.extend(key.split('/'));
        path
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Write the payload to a temp file, fsync it, then rename it over the
    /// final path. The temp file is removed on any failure.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> StorageResult<PutObjectOutput> {
        self.ensure_bucket_name_safe(bucket)?;
        self.ensure_key_safe(key)?;

        let file_path = self.object_path(bucket, key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(err) = write_synced(&tmp_path, &body).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        let etag = format!("{:x}", md5::compute(&body));
        debug!(
            "wrote {} bytes to {} (etag {})",
            body.len(),
            file_path.display(),
            etag
        );

        Ok(PutObjectOutput { etag: Some(etag) })
    }

    /// Write/read/delete a probe file under the bucket directory.
    async fn check(&self, bucket: &str) -> StorageResult<()> {
        self.ensure_bucket_name_safe(bucket)?;
        let root = self.bucket_root(bucket);
        fs::create_dir_all(&root).await?;

        let probe = root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe, b"readyz").await?;
        let read_back = fs::read(&probe).await;
        let _ = fs::remove_file(&probe).await;

        if read_back? != b"readyz" {
            return Err(StorageError::Backend("probe file content mismatch".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

async fn write_synced(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(body).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
