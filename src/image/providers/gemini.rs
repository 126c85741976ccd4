//! Gemini (Google) image editing provider.

use crate::error::{EditError, Result};
use crate::image::provider::ImageEditor;
use crate::image::providers::transport::{
    Content, GenerateContentRequest, GenerateContentResponse, HttpTransport, InlineData, Part,
    RequestPart, Transport, DEFAULT_BASE_URL,
};
use crate::image::types::{EncodedImage, DEFAULT_MIME_TYPE};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GOOGLE_API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl std::fmt::Debug for GeminiEditorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEditorBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API origin used by the default HTTP transport.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the HTTP transport entirely.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the editor.
    ///
    /// A missing API key is not an error here; it is reported when an edit
    /// is requested, before anything is sent.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = resolve_api_key(self.api_key, |name| std::env::var(name).ok());

        let transport: Arc<dyn Transport> = match (self.transport, self.base_url) {
            (Some(transport), _) => transport,
            (None, Some(url)) if url.trim().is_empty() => {
                return Err(EditError::InvalidRequest("base URL must not be empty".into()));
            }
            (None, url) => Arc::new(HttpTransport::new(
                url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )),
        };

        Ok(GeminiEditor {
            transport,
            api_key,
            model: self.model,
        })
    }
}

fn resolve_api_key(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    explicit
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|name| lookup(name)))
        .find(|key| !key.trim().is_empty())
}

/// Gemini image editing provider.
#[derive(Clone)]
pub struct GeminiEditor {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    model: GeminiModel,
}

impl std::fmt::Debug for GeminiEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEditor")
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiEditor {
    /// Creates a new [`GeminiEditorBuilder`].
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    /// Returns true if an API key was found.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_edit_impl(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EditError::Configuration(format!(
                "Please set the {} environment variable.",
                API_KEY_ENV_VARS[0]
            ))
        })?;

        let start = Instant::now();
        let body = build_request(image, instruction);
        tracing::debug!(
            model = self.model.as_str(),
            mime_type = %image.mime_type,
            payload_len = image.data.len(),
            "sending Gemini edit request"
        );

        let response = self
            .transport
            .generate_content(self.model.as_str(), api_key, &body)
            .await
            .inspect_err(|e| tracing::error!("Gemini API error: {e}"))?;

        let edited = extract_edited_image(response)?;
        tracing::debug!(
            mime_type = %edited.mime_type,
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini edit complete"
        );
        Ok(edited)
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn request_edit(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
        self.request_edit_impl(image, instruction).await
    }

    fn name(&self) -> &str {
        match self.model {
            GeminiModel::NanoBanana => "Gemini 2.5 Flash Image",
            GeminiModel::NanoBananaPro => "Gemini 3 Pro Image",
        }
    }
}

/// Image first, instruction second.
fn build_request(image: &EncodedImage, instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                RequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
                RequestPart::Text {
                    text: instruction.to_string(),
                },
            ],
        }],
    }
}

/// A response part reduced to what we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    /// Inline binary data; the MIME type may be missing.
    Image {
        /// Base64 data.
        data: String,
        /// Declared MIME type.
        mime_type: Option<String>,
    },
    /// Text, typically an explanation or refusal.
    Text(String),
}

impl ResponsePart {
    /// Inline data takes precedence when a part carries both.
    fn from_wire(part: Part) -> Option<Self> {
        match (part.inline_data, part.text) {
            (Some(inline), _) => Some(Self::Image {
                data: inline.data,
                mime_type: inline.mime_type,
            }),
            (None, Some(text)) => Some(Self::Text(text)),
            (None, None) => None,
        }
    }
}

const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

fn extract_edited_image(response: GenerateContentResponse) -> Result<EncodedImage> {
    let GenerateContentResponse {
        candidates,
        prompt_feedback,
    } = response;

    let candidate = candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let parts = candidate
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default();

    if parts.is_empty() {
        let safety_stop = finish_reason.filter(|r| SAFETY_FINISH_REASONS.contains(&r.as_str()));
        let reason = prompt_feedback
            .and_then(|f| f.block_reason_message.or(f.block_reason))
            .or(safety_stop);
        if let Some(ref reason) = reason {
            tracing::warn!(%reason, "Gemini blocked the edit");
        }
        return Err(EditError::NoContent { reason });
    }

    let parts: Vec<ResponsePart> = parts
        .into_iter()
        .filter_map(ResponsePart::from_wire)
        .collect();
    select_edited_image(&parts)
}

/// Picks the edited image out of the returned parts.
///
/// The first inline-data part wins and later images are ignored. With no
/// usable image, the first non-empty text part becomes a refusal.
pub fn select_edited_image(parts: &[ResponsePart]) -> Result<EncodedImage> {
    let first_image = parts.iter().find_map(|part| match part {
        ResponsePart::Image { data, mime_type } => Some((data, mime_type)),
        ResponsePart::Text(_) => None,
    });

    if let Some((data, mime_type)) = first_image.filter(|(data, _)| !data.is_empty()) {
        let mime_type = mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        return Ok(EncodedImage::new(data.clone(), mime_type));
    }

    let first_text = parts.iter().find_map(|part| match part {
        ResponsePart::Text(text) if !text.is_empty() => Some(text),
        _ => None,
    });

    match first_text {
        Some(text) => {
            tracing::warn!(%text, "Gemini returned text instead of an image");
            Err(EditError::Refusal(text.clone()))
        }
        None => Err(EditError::NoImage),
    }
}
