//! Core types for image editing.

use crate::error::{EditError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Content type assumed when the model omits one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Image formats we can recognise by name or by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type (parameters ignored) back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Where a source image's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceContent {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// A user-selected image: binary content plus its declared content type.
///
/// Only content types in the `image/` category are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    content: SourceContent,
    content_type: String,
}

impl SourceImage {
    /// Wraps in-memory bytes with a declared content type.
    pub fn from_bytes(data: Vec<u8>, content_type: impl Into<String>) -> Result<Self> {
        Self::with_content(SourceContent::Bytes(data), content_type.into())
    }

    /// References a file on disk with a declared content type.
    ///
    /// The file is not touched until the image is encoded.
    pub fn from_file(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Result<Self> {
        Self::with_content(SourceContent::File(path.into()), content_type.into())
    }

    /// Reads a file and works out its content type, preferring magic
    /// bytes over the file extension.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;

        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });

        match format {
            Some(format) => Self::from_bytes(data, format.mime_type()),
            None => Err(EditError::InvalidRequest(format!(
                "{} is not a recognised image file",
                path.display()
            ))),
        }
    }

    fn with_content(content: SourceContent, content_type: String) -> Result<Self> {
        if !content_type.to_lowercase().starts_with("image/") {
            return Err(EditError::InvalidRequest(format!(
                "Please upload a valid image file (got content type {content_type:?})"
            )));
        }
        Ok(Self {
            content,
            content_type,
        })
    }

    /// Returns the declared content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the backing file path, if this image was selected from disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            SourceContent::File(path) => Some(path),
            SourceContent::Bytes(_) => None,
        }
    }

    /// Loads the full binary content.
    pub(crate) async fn read(&self) -> Result<Vec<u8>> {
        match &self.content {
            SourceContent::Bytes(data) => Ok(data.clone()),
            SourceContent::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

/// Base64 image payload paired with its content type.
///
/// Used both for the image sent to the model and the edited image it
/// returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "encoded image should be sent, saved or displayed"]
pub struct EncodedImage {
    /// Base64 text, no `data:` prefix.
    pub data: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl EncodedImage {
    /// Creates an encoded image from an existing base64 payload.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encodes raw bytes.
    pub fn from_raw(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        )
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| EditError::Decode(e.to_string()))
    }

    /// Returns the format implied by the MIME type.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Suggested file name for downloading this image.
    pub fn download_file_name(&self, timestamp_millis: u128) -> String {
        let ext = self.format().unwrap_or_default().extension();
        format!("nano-banana-edit-{timestamp_millis}.{ext}")
    }

    /// Decodes the payload and writes it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.decode()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }
}
