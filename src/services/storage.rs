// Blob backends for uploaded files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from blob store: {0}")]
    Backend(String),
}

/// Where a stored blob can be fetched from
#[derive(Debug, Clone, PartialEq)]
pub enum StoredLocation {
    /// Absolute public URL handed back by the backend
    Url(String),
    /// Path served by this process (e.g. `/uploads/<key>`)
    Local(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredLocation, StorageError>;
}

/// Writes blobs into a directory served under `/uploads`.
pub struct LocalDiskStore {
    dir: PathBuf,
}

impl LocalDiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl BlobStore for LocalDiskStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredLocation, StorageError> {
        if !is_safe_key(key) {
            return Err(StorageError::Backend(format!("refusing unsafe key {key:?}")));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(key), bytes).await?;

        Ok(StoredLocation::Local(format!("/uploads/{key}")))
    }
}

/// Public object storage reached over HTTP (Vercel Blob compatible API).
pub struct RemoteBlobStore {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct PutBlobResponse {
    url: String,
}

impl RemoteBlobStore {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredLocation, StorageError> {
        let response = self
            .client
            .put(format!("{}/{}", self.api_url, key))
            .bearer_auth(&self.token)
            .header("x-api-version", "7")
            .header("x-access", "public")
            .header("x-content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend(format!("status {status}: {body}")));
        }

        let blob: PutBlobResponse = response.json().await?;
        Ok(StoredLocation::Url(blob.url))
    }
}

/// Keys are single path segments; anything that could escape the upload
/// directory is rejected.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.contains('/')
        && !key.contains('\\')
        && !key.contains("..")
        && !key.starts_with('.')
}

/// Reads a blob previously written by [`LocalDiskStore`]; `None` when absent.
pub async fn read_local(dir: &Path, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
    if !is_safe_key(key) {
        return Ok(None);
    }

    match tokio::fs::read(dir.join(key)).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
