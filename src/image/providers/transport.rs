//! Wire types and HTTP transport for the Gemini `generateContent` endpoint.

use crate::error::{error_message_from_body, EditError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Gemini API origin.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Issues one `generateContent` call against the remote model.
///
/// This is the only place the network is touched, so tests swap it out to
/// observe or fake the remote side.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to `model`, authenticating with `api_key`.
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport talking to `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn parse_error(status: u16, body: &str) -> EditError {
    let message = error_message_from_body(body);
    match status {
        401 | 403 => EditError::Auth(message),
        _ => EditError::Api { status, message },
    }
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; edits always send exactly one.
    pub contents: Vec<Content>,
}

/// One turn of request content.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    /// Ordered multimodal parts.
    pub parts: Vec<RequestPart>,
}

/// A request part: inline image data or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    /// Base64 image bytes.
    InlineData {
        /// The payload.
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
}

/// Inline binary payload as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64 data.
    pub data: String,
}

/// Response of a `generateContent` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate answers; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Set when the prompt itself was rejected.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One candidate answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content, absent when generation was stopped early.
    #[serde(default)]
    pub content: Option<CandidateContent>,
    /// Why generation stopped (`STOP`, `SAFETY`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    /// Returned parts, in order.
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

/// A returned part; either field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Inline binary data.
    #[serde(default)]
    pub inline_data: Option<ResponseInlineData>,
    /// Text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Inline data as returned by the model; the MIME type is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInlineData {
    /// Base64 data.
    #[serde(default)]
    pub data: String,
    /// MIME type, when the model states one.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Prompt-level safety feedback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason, e.g. `SAFETY`.
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human-readable explanation of the block.
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn sample_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                    RequestPart::Text {
                        text: "Make it pop".into(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let json = serde_json::to_value(sample_request()).unwrap();
        let parts = &json["contents"][0]["parts"];

        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert!(parts[0].get("inline_data").is_none());
        assert_eq!(parts[1]["text"], "Make it pop");
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.candidates[0].finish_reason.as_deref(), Some("STOP"));

        let parts = resp.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .as_ref()
            .unwrap();
        assert_eq!(parts[0].text.as_deref(), Some("Here you go"));
        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type.as_deref(), Some("image/png"));
        assert_eq!(inline.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_response_missing_mime_type_and_parts() {
        let json = r#"{"candidates": [
            {"content": {"parts": [{"inlineData": {"data": "BBBB"}}]}},
            {"content": {}}
        ]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();

        let parts = resp.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .as_ref()
            .unwrap();
        assert!(parts[0].inline_data.as_ref().unwrap().mime_type.is_none());
        assert!(resp.candidates[1].content.as_ref().unwrap().parts.is_none());
    }

    #[test]
    fn test_parse_error_statuses() {
        assert!(matches!(parse_error(403, "denied"), EditError::Auth(m) if m == "denied"));
        match parse_error(500, "") {
            EditError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, crate::error::GENERIC_FAILURE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_posts_to_generate_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash-image:generateContent",
            )
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"text": "Make it pop"}
                ]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [
                    {"inlineData": {"mimeType": "image/jpeg", "data": "CCCC"}}
                ]}}]})
                .to_string(),
            )
            .create_async()
            .await;

        let transport = HttpTransport::new(format!("{}/", server.url()));
        let resp = transport
            .generate_content("gemini-2.5-flash-image", "test-key", &sample_request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_service_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": {"code": 400, "message": "Unsupported MIME type"}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url());
        let err = transport
            .generate_content("m", "k", &sample_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error: 400 - Unsupported MIME type");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_bad_gateway_without_body_uses_generic_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url());
        let err = transport
            .generate_content("m", "k", &sample_request())
            .await
            .unwrap_err();

        match err {
            EditError::Api {
                status: 502,
                ref message,
            } => assert_eq!(message, crate::error::GENERIC_FAILURE),
            ref other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url());
        let err = transport
            .generate_content("m", "k", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, EditError::Json(_)));
    }
}
