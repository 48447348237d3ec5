use crate::services::metadata::MetadataStore;
use crate::services::storage::StorageService;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("object listing failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/// How `open` presents a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
    Unsupported,
}

impl ContentKind {
    /// Classifies by the extension of the URL's (or key's) last path segment.
    pub fn from_url(url: &str) -> Self {
        let name = url.rsplit('/').next().unwrap_or(url).trim();
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => ContentKind::Text,
            Some("jpeg" | "jpg" | "png") => ContentKind::Image,
            _ => ContentKind::Unsupported,
        }
    }
}

/// Extension (with leading dot) a received payload is stored under.
///
/// PNG and JPEG are recognised from the bytes. Anything else keeps the extension
/// of the name it was sent with; image messages carry no name and default to JPEG.
pub fn stored_extension(data: &[u8], declared_name: Option<&str>) -> String {
    match infer::get(data).map(|t| t.mime_type()) {
        Some("image/png") => return ".png".to_string(),
        Some("image/jpeg") => return ".jpeg".to_string(),
        _ => {}
    }

    match declared_name {
        Some(name) => Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default(),
        None => ".jpeg".to_string(),
    }
}

/// Content type sent along with the object.
pub fn content_type_for(data: &[u8]) -> &'static str {
    match infer::get(data) {
        Some(kind) => kind.mime_type(),
        None if std::str::from_utf8(data).is_ok() => TEXT_CONTENT_TYPE,
        None => BINARY_CONTENT_TYPE,
    }
}

/// Picks the object a bare file name refers to: the exact key or `name.<ext>`.
/// A key that merely starts with the name (`report2.txt` for `report`) belongs
/// to another file and never matches.
pub fn match_key<'a>(keys: &'a [String], file_name: &str) -> Option<&'a String> {
    let with_dot = format!("{}.", file_name);
    keys.iter()
        .find(|k| k.as_str() == file_name || k.starts_with(&with_dot))
}

/// Maps file names to public content URLs, bridging the metadata and object stores.
pub struct ContentResolver {
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<dyn StorageService>,
}

impl ContentResolver {
    pub fn new(metadata: Arc<dyn MetadataStore>, storage: Arc<dyn StorageService>) -> Self {
        Self { metadata, storage }
    }

    pub async fn resolve(&self, file_name: &str) -> Result<String, ResolveError> {
        match self.metadata.get_content_url(file_name).await {
            Ok(Some(url)) => return Ok(url),
            Ok(None) => {}
            Err(e) => tracing::warn!("Metadata lookup for {} failed: {:?}", file_name, e),
        }

        // Degraded mode: metadata has no URL (upload never finished, or the row was
        // renamed away from its object), so scan the bucket.
        let keys = self.storage.list_objects("").await?;
        let key = match_key(&keys, file_name)
            .ok_or_else(|| ResolveError::NotFound(file_name.to_string()))?;
        let url = self.storage.public_url(key);

        tracing::warn!(
            "Resolved {} by bucket scan to key {} ({} objects listed); metadata is out of sync",
            file_name,
            key,
            keys.len()
        );

        match self.metadata.update_content_url(file_name, &url).await {
            Ok(true) => tracing::info!("Back-filled content URL for {}", file_name),
            Ok(false) => tracing::warn!("No metadata row to back-fill for {}", file_name),
            Err(e) => tracing::warn!("Could not back-fill content URL for {}: {:?}", file_name, e),
        }

        Ok(url)
    }

    /// Reads a stored text file through the object store.
    pub async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        let key = self
            .storage
            .key_from_url(url)
            .ok_or_else(|| anyhow::anyhow!("Cannot derive object key from {}", url))?;
        let data = self.storage.get_file(&key).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
