mod client;
pub(crate) mod types;

use std::time::Duration;

use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::util::truncate_to_char_boundary;
use crate::AiError;
use client::GeminiClient;
use types::{GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// =============================================================================
// Request / Result
// =============================================================================

/// Instruction text plus one inline image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionRequest {
    prompt_text: String,
    image_payload: String,
    mime_type: String,
}

impl VisionRequest {
    /// Build a request from raw image bytes, base64-encoding them.
    pub fn new(prompt_text: impl Into<String>, image: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            image_payload: base64::engine::general_purpose::STANDARD.encode(image),
            mime_type: mime_type.into(),
        }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    /// Base64-encoded image bytes.
    pub fn image_payload(&self) -> &str {
        &self.image_payload
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Outcome of one generateContent call.
#[derive(Debug, Clone, PartialEq)]
pub enum VisionResult {
    /// Status 200 with at least one generated text part.
    Success(String),
    /// Non-200, or 200 without usable text. `body` is the decoded JSON payload,
    /// or `{"raw_text": <body>}` when the body is not JSON.
    ApiError { status: u16, body: Value },
    /// Connection, timeout, or body-read failure.
    TransportError(String),
}

/// Classify a raw HTTP exchange.
pub fn classify_response(status: u16, body: &str) -> VisionResult {
    if status == 200 {
        if let Ok(parsed) = serde_json::from_str::<GenerateContentResponse>(body) {
            if let Some(text) = parsed.text() {
                return VisionResult::Success(text);
            }
        }
    }

    VisionResult::ApiError {
        status,
        body: decode_error_body(body),
    }
}

fn decode_error_body(body: &str) -> Value {
    serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!({ "raw_text": body }))
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::Config("API key must not be empty".to_string()));
        }
        Ok(Self {
            api_key,
            model: model.into(),
            base_url: None,
            timeout: None,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> Result<GeminiClient, AiError> {
        let client = GeminiClient::new(&self.api_key, self.timeout)?;
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Send an image plus instruction text and classify the reply.
    ///
    /// Never retries; a failed call is returned to the caller as-is.
    pub async fn describe_image(&self, request: &VisionRequest) -> VisionResult {
        let wire = GenerateContentRequest::image_prompt(
            request.prompt_text(),
            request.mime_type(),
            request.image_payload(),
        );

        let exchange = match self.client() {
            Ok(client) => client.generate_content(&self.model, &wire).await,
            Err(e) => Err(e),
        };

        match exchange {
            Ok((status, body)) => {
                let result = classify_response(status, &body);
                match &result {
                    VisionResult::Success(text) => {
                        debug!(status, chars = text.chars().count(), "Gemini returned text")
                    }
                    _ => warn!(
                        status,
                        body = truncate_to_char_boundary(&body, 512),
                        "Gemini returned no usable text"
                    ),
                }
                result
            }
            Err(e) => {
                warn!(error = %e, "Gemini request failed");
                VisionResult::TransportError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;

    #[test]
    fn test_new_rejects_empty_api_key() {
        assert!(matches!(
            Gemini::new("   ", DEFAULT_MODEL),
            Err(AiError::Config(_))
        ));
    }

    #[test]
    fn test_gemini_with_base_url() {
        let ai = Gemini::new("test-key", DEFAULT_MODEL)
            .unwrap()
            .with_base_url("https://proxy.example.com");
        assert_eq!(ai.base_url.as_deref(), Some("https://proxy.example.com"));
        assert_eq!(ai.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let ai = Gemini::new("super-secret", DEFAULT_MODEL).unwrap();
        assert!(!format!("{ai:?}").contains("super-secret"));
    }

    #[test]
    fn test_vision_request_encodes_image() {
        let request = VisionRequest::new("prompt", b"abc", "image/jpeg");
        assert_eq!(request.image_payload(), "YWJj");
        assert_eq!(request.mime_type(), "image/jpeg");
        assert_eq!(request.prompt_text(), "prompt");
    }

    #[test]
    fn test_classify_success() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"這是食品"}]}}]}"#;
        assert_eq!(
            classify_response(200, body),
            VisionResult::Success("這是食品".to_string())
        );
    }

    #[test]
    fn test_classify_200_without_text_is_api_error() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        match classify_response(200, body) {
            VisionResult::ApiError { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body["candidates"][0]["finishReason"], "SAFETY");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_non_200_json_body_is_unchanged() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let expected: Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            classify_response(400, body),
            VisionResult::ApiError {
                status: 400,
                body: expected
            }
        );
    }

    #[test]
    fn test_classify_non_json_body_is_wrapped() {
        assert_eq!(
            classify_response(502, "Bad Gateway"),
            VisionResult::ApiError {
                status: 502,
                body: json!({ "raw_text": "Bad Gateway" })
            }
        );
    }

    #[tokio::test]
    async fn test_describe_image_posts_generate_content_with_key() {
        let reply = r#"{"candidates":[{"content":{"parts":[{"text":"這是感冒糖漿"}]}}]}"#;
        let (base_url, server) = serve(vec![(200, reply.to_string())]).await;
        let ai = Gemini::new("test-key", DEFAULT_MODEL)
            .unwrap()
            .with_base_url(base_url);
        let request = VisionRequest::new("請說明", b"abc", "image/jpeg");

        let result = ai.describe_image(&request).await;
        assert_eq!(result, VisionResult::Success("這是感冒糖漿".to_string()));

        let requests = server.await.unwrap();
        let raw = &requests[0];
        assert!(
            raw.starts_with(
                "POST /v1/models/gemini-1.5-flash:generateContent?key=test-key HTTP/1.1\r\n"
            ),
            "{raw}"
        );

        let body_start = raw.find("\r\n\r\n").unwrap() + 4;
        let body: Value = serde_json::from_str(&raw[body_start..]).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "請說明");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "YWJj");
    }

    #[tokio::test]
    async fn test_describe_image_classifies_error_status() {
        let reply = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        let (base_url, server) = serve(vec![(400, reply.to_string())]).await;
        let ai = Gemini::new("bad-key", DEFAULT_MODEL)
            .unwrap()
            .with_base_url(base_url);

        let result = ai
            .describe_image(&VisionRequest::new("請說明", b"abc", "image/png"))
            .await;
        assert_eq!(
            result,
            VisionResult::ApiError {
                status: 400,
                body: json!({ "error": { "code": 400, "message": "API key not valid" } })
            }
        );
        server.await.unwrap();
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let ai = Gemini::new("test-key", DEFAULT_MODEL)
            .unwrap()
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(5));
        let request = VisionRequest::new("prompt", b"abc", "image/jpeg");

        let result = tokio_test::block_on(ai.describe_image(&request));
        assert!(matches!(result, VisionResult::TransportError(_)));
    }
}
