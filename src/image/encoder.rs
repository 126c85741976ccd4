//! Turns a selected image into a transport-safe payload.

use crate::error::{EditError, Result};
use crate::image::types::{EncodedImage, SourceImage};

/// Reads the source image and base64-encodes it.
///
/// The payload carries no `data:` prefix. Unreadable content surfaces as
/// [`EditError::Io`]; nothing is retried.
pub async fn encode(source: &SourceImage) -> Result<EncodedImage> {
    let bytes = source.read().await?;
    if bytes.is_empty() {
        return Err(EditError::InvalidRequest("image content is empty".into()));
    }

    tracing::debug!(
        content_type = source.content_type(),
        size_bytes = bytes.len(),
        "encoded source image"
    );

    Ok(EncodedImage::from_raw(&bytes, source.content_type()))
}
