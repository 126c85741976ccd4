//! Image encoding and editing.

mod encoder;
mod provider;
pub mod providers;
mod types;

pub use encoder::encode;
pub use provider::ImageEditor;
pub use types::{EncodedImage, ImageFormat, SourceImage, DEFAULT_MIME_TYPE};
