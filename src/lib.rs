#![warn(missing_docs)]
//! Banana Edit - natural-language photo editing with Gemini image models.
//!
//! Pick a photo, describe the change (or use a preset), get the edited
//! image back.
//!
//! # Quick Start
//!
//! ```no_run
//! use banana_edit::{encode, GeminiEditor, ImageEditor, SourceImage};
//!
//! #[tokio::main]
//! async fn main() -> banana_edit::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let source = SourceImage::open("portrait.jpg").await?;
//!     let encoded = encode(&source).await?;
//!     let edited = editor.request_edit(&encoded, "Add a pair of sunglasses").await?;
//!     edited.save("edited.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! [`EditSession`] wraps an editor in the idle → ready → processing →
//! complete/error workflow a front end renders from:
//!
//! ```no_run
//! use banana_edit::{find_preset, EditSession, GeminiEditor, SourceImage};
//!
//! # async fn run() -> banana_edit::Result<()> {
//! let mut session = EditSession::new(GeminiEditor::builder().build()?);
//! session.select_image(SourceImage::open("portrait.jpg").await?);
//! if let Some(preset) = find_preset("cyberpunk-vibe") {
//!     session.apply_preset(preset);
//! }
//! session.generate().await;
//! match (session.result(), session.error()) {
//!     (Some(image), _) => println!("{}", image.to_data_url()),
//!     (None, Some(message)) => eprintln!("{message}"),
//!     (None, None) => {}
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! The API key comes from the builder, or else `API_KEY`, or else
//! `GOOGLE_API_KEY`. A missing key surfaces as
//! [`EditError::Configuration`] when an edit is requested.

mod error;
pub mod image;
pub mod presets;
pub mod workflow;

// Re-export error types at crate root
pub use error::{EditError, Result};

pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use image::{encode, EncodedImage, ImageEditor, ImageFormat, SourceImage};
pub use presets::{find_preset, PresetPrompt, PRESETS};
pub use workflow::{EditSession, WorkflowEvent, WorkflowState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{EditError, Result};
    pub use crate::image::providers::GeminiEditor;
    pub use crate::image::{encode, EncodedImage, ImageEditor, SourceImage};
    pub use crate::presets::find_preset;
    pub use crate::workflow::{EditSession, WorkflowState};
}
