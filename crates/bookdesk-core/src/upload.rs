// ── Upload/preview flow ──
//
// One `UploadSlot` per file field. Selecting a file renders a local
// data-URL preview immediately; the upload then stores the returned key
// and swaps the preview for the server-resolved URL. The slot reports
// itself as uploading from selection until the upload settles.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bookdesk_api::{AdminClient, StorageCategory, UploadFile};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::CoreError;

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path).map_err(|e| CoreError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        let mime = mime_for(&name);
        Ok(Self::new(name, mime, bytes))
    }

    /// Inline preview: `data:<mime>;base64,<bytes>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// The wire form of this file.
    pub fn to_upload(&self) -> UploadFile {
        UploadFile::new(self.name.clone(), self.bytes.clone()).with_mime(self.mime.clone())
    }
}

/// MIME type for the handful of formats the catalog deals in.
pub fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Resolve a storage key to a renderable URL. Values that are already
/// absolute URLs pass through untouched.
pub async fn resolve_display_url(client: &AdminClient, key: &str) -> Result<String, CoreError> {
    if key.starts_with("http") {
        return Ok(key.to_owned());
    }
    Ok(client.storage_url(key).await?)
}

/// Result of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Key stored, preview now points at the server URL.
    Resolved,
    /// Key stored, but the URL lookup failed; no preview.
    Unresolved,
}

/// State of one file field.
#[derive(Debug, Clone, Default)]
pub struct UploadSlot {
    category: StorageCategory,
    key: Option<String>,
    preview: Option<String>,
    pending: Option<LocalFile>,
    /// Bumped whenever the file input must be cleared, so the same file
    /// can be selected again.
    input_resets: u64,
}

impl UploadSlot {
    pub fn new(category: StorageCategory) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    pub fn category(&self) -> StorageCategory {
        self.category
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.pending.is_some()
    }

    /// What the form shows next to the field.
    pub fn indicator(&self) -> &str {
        self.key.as_deref().unwrap_or("None")
    }

    pub fn input_resets(&self) -> u64 {
        self.input_resets
    }

    /// Show the local preview and mark the slot busy. No network.
    pub fn select(&mut self, file: LocalFile) {
        self.preview = Some(file.data_url());
        self.pending = Some(file);
    }

    /// Upload the selected file, store its key and resolve the preview.
    /// On failure the field reverts to empty.
    pub async fn upload_selected(&mut self, client: &AdminClient) -> Result<UploadOutcome, CoreError> {
        let Some(file) = self.pending.clone() else {
            return Err(CoreError::Internal("no file selected".into()));
        };

        let outcome = match client.upload(&file.to_upload(), self.category, None).await {
            Ok(key) => {
                debug!(%key, category = %self.category, "file uploaded");
                self.key = Some(key.clone());
                match resolve_display_url(client, &key).await {
                    Ok(url) => {
                        self.preview = Some(url).filter(|u| !u.is_empty());
                        Ok(UploadOutcome::Resolved)
                    }
                    Err(e) => {
                        warn!(%key, error = %e, "could not resolve uploaded file");
                        self.preview = None;
                        Ok(UploadOutcome::Unresolved)
                    }
                }
            }
            Err(e) => {
                self.key = None;
                self.preview = None;
                Err(CoreError::from(e))
            }
        };
        self.pending = None;
        outcome
    }

    /// Select and upload in one step.
    pub async fn upload(&mut self, client: &AdminClient, file: LocalFile) -> Result<UploadOutcome, CoreError> {
        self.select(file);
        self.upload_selected(client).await
    }

    /// Adopt a key stored on an existing record and resolve its preview.
    pub async fn load_key(&mut self, client: &AdminClient, key: Option<String>) {
        self.pending = None;
        self.preview = None;
        self.key = key.filter(|k| !k.is_empty());
        if let Some(key) = &self.key {
            match resolve_display_url(client, key).await {
                Ok(url) => self.preview = Some(url).filter(|u| !u.is_empty()),
                Err(e) => debug!(%key, error = %e, "stored key did not resolve"),
            }
        }
    }

    /// Clear the key and preview and reset the file input.
    pub fn remove(&mut self) {
        self.key = None;
        self.preview = None;
        self.pending = None;
        self.input_resets += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.key = None;
        self.preview = None;
        self.pending = None;
    }
}
