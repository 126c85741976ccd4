//! Error types for image editing.

/// Fallback message when a transport failure carries no text of its own.
pub(crate) const GENERIC_FAILURE: &str = "Failed to process image with Gemini.";

/// Errors that can occur while encoding, requesting or decoding an edit.
///
/// Every variant renders a message fit to show the user as-is; callers
/// that only display errors never need to match on the variant.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// No credential configured for the remote model.
    #[error("API Key is missing. {0}")]
    Configuration(String),

    /// Source image content could not be read.
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-side input rejected before any request was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the service, or a generic fallback.
        message: String,
    },

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Model answered with text instead of an image.
    #[error("Model returned text instead of image: {0}")]
    Refusal(String),

    /// Response had no content parts at all.
    #[error("No content generated from the model.{}", blocked_suffix(.reason))]
    NoContent {
        /// Block or safety reason sent alongside the empty response.
        reason: Option<String>,
    },

    /// Response parts held neither an image nor text.
    #[error("Model did not return a valid image.")]
    NoImage,

    /// Base64 payload could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),
}

impl EditError {
    /// Returns true if submitting the same edit again might succeed.
    ///
    /// Configuration and I/O failures need the user to fix something
    /// first; nothing here retries automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Network(_)
            | Self::Json(_)
            | Self::Refusal(_)
            | Self::NoContent { .. }
            | Self::NoImage => true,
            _ => false,
        }
    }
}

fn blocked_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" (blocked: {reason})"),
        None => String::new(),
    }
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, EditError>;

/// Pulls a human-readable message out of an error body.
///
/// Google APIs answer with `{"error": {"message": ...}}`; anything else is
/// passed through trimmed, and an empty body yields the generic fallback.
pub(crate) fn error_message_from_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
        {
            return msg.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        trimmed.to_string()
    }
}
