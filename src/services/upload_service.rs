use std::path::PathBuf;
use std::sync::Arc;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use chrono::Utc;
use rand::Rng;

use crate::config::AppConfig;
use crate::services::storage::{BlobStore, LocalDiskStore, RemoteBlobStore, StorageError, StoredLocation};

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Accepts uploads, names them and hands them to the configured backend.
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    max_bytes: usize,
    public_base_url: Option<String>,
    local_dir: PathBuf,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn BlobStore>,
        max_bytes: usize,
        public_base_url: Option<String>,
        local_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            max_bytes,
            public_base_url,
            local_dir,
        }
    }

    /// Remote object storage when a blob token is configured, local disk otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn BlobStore> = match &config.blob_token {
            Some(token) => {
                tracing::info!(api_url = %config.blob_api_url, "uploads go to remote blob storage");
                Arc::new(RemoteBlobStore::new(config.blob_api_url.clone(), token.clone()))
            }
            None => {
                tracing::info!(dir = %config.upload_dir.display(), "uploads go to local disk");
                Arc::new(LocalDiskStore::new(config.upload_dir.clone()))
            }
        };

        Self::new(
            store,
            config.upload_max_bytes,
            config.public_base_url.clone(),
            config.upload_dir.clone(),
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn local_dir(&self) -> &std::path::Path {
        &self.local_dir
    }

    /// Stores `bytes` under a fresh key derived from `filename` and returns the
    /// public URL. `request_base` (`scheme://host`) resolves local paths when no
    /// public base URL is configured.
    pub async fn store(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        request_base: &str,
    ) -> Result<String, StorageError> {
        let key = generate_storage_key(filename);
        let content_type = content_type_for(&key);
        let size = bytes.len();

        let location = self.store.put(&key, bytes, content_type).await?;
        let url = self.resolve_url(location, request_base);

        tracing::info!(%key, size, %url, "file uploaded");
        Ok(url)
    }

    fn resolve_url(&self, location: StoredLocation, request_base: &str) -> String {
        match location {
            StoredLocation::Url(url) => url,
            StoredLocation::Local(path) => {
                let base = self.public_base_url.as_deref().unwrap_or(request_base);
                format!("{}{}", base.trim_end_matches('/'), path)
            }
        }
    }
}

/// Decodes a data URL (`data:<mime>;base64,<payload>`) or bare base64.
pub fn decode_payload(file: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match file.split_once(',') {
        Some((_, data)) => data,
        None => file,
    };
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    PAYLOAD_ENGINE.decode(payload)
}

/// `<unix-millis>-<random>` plus the original extension.
pub fn generate_storage_key(filename: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..1_000_000_000u32);
    storage_key(filename, Utc::now().timestamp_millis(), suffix)
}

pub fn storage_key(filename: &str, millis: i64, suffix: u32) -> String {
    match extension_of(filename) {
        Some(ext) => format!("{millis}-{suffix}.{ext}"),
        None => format!("{millis}-{suffix}"),
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(16)
        .collect();

    (!ext.is_empty()).then_some(ext)
}

pub fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "glb" => "model/gltf-binary",
        "gltf" => "model/gltf+json",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
