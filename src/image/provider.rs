//! Image editor trait.

use crate::error::Result;
use crate::image::types::EncodedImage;
use async_trait::async_trait;

/// Something that can apply a natural-language edit to an image.
///
/// Implementations hold no per-request state and do not serialize calls:
/// two concurrent edits on one editor are allowed and independent. Callers
/// that need one-at-a-time behaviour (see
/// [`EditSession`](crate::workflow::EditSession)) enforce it themselves.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends `image` with `instruction` and returns the edited image.
    ///
    /// The instruction is passed through untouched.
    async fn request_edit(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}
