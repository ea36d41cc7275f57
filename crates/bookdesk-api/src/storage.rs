// Object storage: multipart upload and key-to-URL resolution.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::client::AdminClient;
use crate::error::Error;

const UPLOAD: &str = "/api/admin/storage/upload";
const URL: &str = "/api/admin/storage/url";

/// Storage bucket/prefix an upload lands in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageCategory {
    /// Downloadable book files.
    Books,
    /// Covers and author portraits.
    Thumbnails,
    #[default]
    Uploads,
}

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    key: String,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    #[serde(default)]
    url: String,
}

impl AdminClient {
    /// Upload a file and return its durable storage key.
    ///
    /// `key` asks the server to store under a specific key instead of
    /// generating one.
    pub async fn upload(
        &self,
        file: &UploadFile,
        category: StorageCategory,
        key: Option<&str>,
    ) -> Result<String, Error> {
        let mut part = Part::stream(file.bytes.clone()).file_name(file.name.clone());
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("type", category.to_string());
        if let Some(key) = key {
            form = form.text("key", key.to_owned());
        }

        debug!(name = %file.name, size = file.len(), %category, "uploading");
        let resp: UploadResponse = self.post_multipart(UPLOAD, form).await?;
        Ok(resp.key)
    }

    /// Exchange a storage key for a servable (usually signed) URL.
    pub async fn storage_url(&self, key: &str) -> Result<String, Error> {
        let resp: UrlResponse = self.get(URL, &[("key", key)]).await?;
        Ok(resp.url)
    }
}
