//! Image editing providers.

mod gemini;
mod transport;

pub use gemini::{
    select_edited_image, GeminiEditor, GeminiEditorBuilder, GeminiModel, ResponsePart,
    API_KEY_ENV_VARS,
};
pub use transport::{
    Candidate, CandidateContent, Content, GenerateContentRequest, GenerateContentResponse,
    HttpTransport, InlineData, Part, PromptFeedback, RequestPart, ResponseInlineData, Transport,
    DEFAULT_BASE_URL,
};
