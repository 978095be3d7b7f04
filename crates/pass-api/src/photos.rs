//! Selfie storage
//!
//! Uploads are decoded, bounded to a maximum resolution, re-encoded as JPEG
//! and written under `selfies/<pass_id>-<unix_millis>.jpg`. Re-uploads add a
//! new file; the newest one is the one shown on the pass.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use pass_common::{Error, PhotoAsset, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Folder photos are stored under, relative to the store root.
pub const SELFIE_FOLDER: &str = "selfies";

/// JPEG quality of stored photos
pub const PHOTO_JPEG_QUALITY: u8 = 85;

/// Storage backend for pass photos
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Store an already-normalized JPEG under a fresh name.
    async fn put(&self, pass_id: &str, jpeg: Vec<u8>) -> Result<PhotoAsset>;

    /// Photos for a pass, newest first
    async fn list(&self, pass_id: &str) -> Result<Vec<PhotoAsset>>;

    /// Bytes of a stored photo by object name
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    async fn latest(&self, pass_id: &str) -> Result<Option<PhotoAsset>> {
        Ok(self.list(pass_id).await?.into_iter().next())
    }
}

/// Decode a base64 payload, accepting either raw base64 or a `data:` URL.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (_, data) = rest
                .split_once(',')
                .ok_or_else(|| Error::validation("Malformed data URL"))?;
            data
        }
        None => payload,
    };

    // Line breaks are common in pasted payloads
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::validation("Missing image payload"));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::validation(format!("Invalid base64 payload: {}", e)))
}

/// Re-encode an uploaded image as JPEG with its longest side bounded.
///
/// `declared_mime` only improves the error message; the format is sniffed
/// from the bytes.
pub fn normalize(bytes: &[u8], declared_mime: Option<&str>, max_dimension: u32) -> Result<Vec<u8>> {
    let format = image::guess_format(bytes).map_err(|_| {
        Error::unsupported(format!(
            "Unsupported image format: {}",
            declared_mime.unwrap_or("unknown")
        ))
    })?;

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| Error::unsupported(format!("Could not decode image: {}", e)))?;

    let bounded = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        debug!(
            "Downscaling {}x{} photo to fit {}",
            decoded.width(),
            decoded.height(),
            max_dimension
        );
        decoded.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = bounded.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, PHOTO_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| Error::Storage(format!("Failed to encode photo: {}", e)))?;
    Ok(buf)
}

/// Photo store on the local filesystem, served back by the API under
/// `/storage`.
#[derive(Debug, Clone)]
pub struct DiskPhotoStore {
    root: PathBuf,
    public_base_url: String,
}

impl DiskPhotoStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory the selfie files live in
    pub fn folder(&self) -> PathBuf {
        self.root.join(SELFIE_FOLDER)
    }

    fn asset(&self, pass_id: &str, name: String, millis: i64, size_bytes: u64) -> PhotoAsset {
        let created_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default();
        PhotoAsset {
            pass_id: pass_id.to_string(),
            path: format!("{}/{}", SELFIE_FOLDER, name),
            url: format!("{}/storage/{}/{}", self.public_base_url, SELFIE_FOLDER, name),
            name,
            created_at,
            size_bytes,
        }
    }

    /// Stage a photo under a hidden name, let `write` fill it, then publish
    /// it under its final name. A failed write removes the staged file, so
    /// listings only ever see complete photos.
    async fn store_with<W, Fut>(&self, pass_id: &str, size_bytes: u64, write: W) -> Result<PhotoAsset>
    where
        W: FnOnce(tokio::fs::File) -> Fut + Send,
        Fut: Future<Output = std::io::Result<()>> + Send,
    {
        let folder = self.folder();
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| storage_err("Failed to create", &folder, e))?;

        // Same-millisecond uploads bump the timestamp rather than overwrite
        let mut millis = Utc::now().timestamp_millis();
        let (staged, file) = loop {
            let staged = folder.join(format!(".{}-{}.jpg.tmp", pass_id, millis));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staged)
                .await
            {
                Ok(file) => break (staged, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(storage_err("Failed to create", &staged, e)),
            }
        };

        if let Err(e) = write(file).await {
            discard(&staged).await;
            return Err(storage_err("Failed to write", &staged, e));
        }

        // Linking fails instead of replacing an existing photo
        let name = loop {
            let name = format!("{}-{}.jpg", pass_id, millis);
            let path = folder.join(&name);
            match tokio::fs::hard_link(&staged, &path).await {
                Ok(()) => break name,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(e) => {
                    discard(&staged).await;
                    return Err(storage_err("Failed to publish", &path, e));
                }
            }
        };
        discard(&staged).await;

        info!("Stored photo {} ({} bytes)", name, size_bytes);
        Ok(self.asset(pass_id, name, millis, size_bytes))
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

fn storage_err(context: &str, path: &Path, err: std::io::Error) -> Error {
    Error::Storage(format!("{} {}: {}", context, path.display(), err))
}

/// Upload timestamp encoded in a photo name, if it belongs to `pass_id`.
fn photo_millis(name: &str, pass_id: &str) -> Option<i64> {
    let rest = name.strip_prefix(pass_id)?.strip_prefix('-')?;
    let digits = rest.strip_suffix(".jpg")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Object names are plain file names; anything that could walk out of the
/// folder is refused.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[async_trait]
impl PhotoStore for DiskPhotoStore {
    async fn put(&self, pass_id: &str, jpeg: Vec<u8>) -> Result<PhotoAsset> {
        let size_bytes = jpeg.len() as u64;
        self.store_with(pass_id, size_bytes, move |mut file: tokio::fs::File| async move {
            file.write_all(&jpeg).await?;
            file.flush().await
        })
        .await
    }

    async fn list(&self, pass_id: &str) -> Result<Vec<PhotoAsset>> {
        let folder = self.folder();
        let mut entries = match tokio::fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_err("Failed to list", &folder, e)),
        };

        let mut photos = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_err("Failed to list", &folder, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(millis) = photo_millis(&name, pass_id) else {
                continue;
            };
            let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            photos.push(self.asset(pass_id, name, millis, size));
        }

        photos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(photos)
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if !is_safe_name(name) {
            return Err(Error::validation(format!("Invalid photo name: {}", name)));
        }

        let path = self.folder().join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("Failed to read", &path, e)),
        }
    }
}
