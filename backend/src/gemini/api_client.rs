//! Gemini API client
//!
//! Direct HTTP client for the Gemini REST API. The `GenerativeApi` trait is
//! the seam the session layer talks to, so tests can swap the network out.

use crate::config::GeminiConfig;
use crate::gemini::error::GenerationError;
use crate::gemini::types::{GeminiApiRequest, GeminiApiResponse};
use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;

/// Ordered, finite sequence of text deltas. `None` from `next()` marks the
/// end of generation; an empty string is a legitimate (empty) fragment.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Remote text/image generation endpoint
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    /// Single request/response call
    async fn generate(
        &self,
        model: &str,
        request: &GeminiApiRequest,
    ) -> Result<GeminiApiResponse, GenerationError>;

    /// Streaming call. Lazy: nothing is sent until the stream is polled, and
    /// request failures surface as the first item.
    fn stream_generate(&self, model: &str, request: GeminiApiRequest) -> FragmentStream;
}

/// Header carrying the API key; request URLs never contain it
const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP implementation of [`GenerativeApi`] backed by `reqwest`
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client against the given base URL
    ///
    /// # Errors
    /// * Returns `GenerationError::Transport` if the HTTP client cannot be built
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the Gemini section of the app config
    pub fn from_config(config: &GeminiConfig) -> Result<Self, GenerationError> {
        Self::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST a request and reject non-success statuses
    async fn post(
        &self,
        url: &str,
        model: &str,
        request: &GeminiApiRequest,
    ) -> Result<reqwest::Response, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        tracing::debug!(
            base_url = %self.base_url,
            model = %model,
            turns = request.contents.len(),
            has_persona = request.system_instruction.is_some(),
            "Calling Gemini API"
        );

        // Shared client (connection pooling)
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Gemini API returned error status"
            );

            return Err(GenerationError::from_status(status_code, error_body));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeApi for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: &GeminiApiRequest,
    ) -> Result<GeminiApiResponse, GenerationError> {
        let url = self.endpoint(model, "generateContent");
        let response = self.post(&url, model, request).await?;
        let response_body = response.text().await?;

        let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
            GenerationError::Decode(format!("{} - Response body: {}", e, response_body))
        })?;

        if let Some(reason) = parsed.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        if parsed.candidates.is_empty() {
            return Err(GenerationError::Empty("candidates"));
        }

        tracing::debug!(model = %model, "Received response from Gemini API");
        Ok(parsed)
    }

    fn stream_generate(&self, model: &str, request: GeminiApiRequest) -> FragmentStream {
        Box::pin(sse_fragments(self.clone(), model.to_string(), request))
    }
}

fn sse_fragments(
    client: GeminiClient,
    model: String,
    request: GeminiApiRequest,
) -> impl Stream<Item = Result<String, GenerationError>> {
    try_stream! {
        let url = format!("{}?alt=sse", client.endpoint(&model, "streamGenerateContent"));
        let response = client.post(&url, &model, &request).await?;

        let mut events = response.bytes_stream().eventsource();
        let mut fragments = 0usize;

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| match e {
                EventStreamError::Transport(e) => GenerationError::Transport(e),
                other => GenerationError::Decode(other.to_string()),
            })?;
            if let Some(fragment) = parse_event(&event.data)? {
                fragments += 1;
                yield fragment;
            }
        }

        tracing::debug!(model = %model, fragments = fragments, "Gemini stream completed");
    }
}

/// Decode one SSE event into an optional text fragment
fn parse_event(event: &str) -> Result<Option<String>, GenerationError> {
    let parsed: GeminiApiResponse = serde_json::from_str(event)
        .map_err(|e| GenerationError::Decode(format!("{} - Event: {}", e, event)))?;

    if let Some(reason) = parsed.block_reason() {
        return Err(GenerationError::Blocked(reason.to_string()));
    }
    Ok(parsed.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::types::Content;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn client(base_url: &str, key: &str) -> GeminiClient {
        GeminiClient::new(key, base_url, Duration::from_secs(5)).unwrap()
    }

    fn request() -> GeminiApiRequest {
        GeminiApiRequest::new(vec![Content::user_text("hi")], Some("persona"))
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, GenerationError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_generate_empty_api_key() {
        let client = client("http://127.0.0.1:9", "");
        let result = client.generate("gemini-test", &request()).await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_stream_empty_api_key_is_first_item() {
        let client = client("http://127.0.0.1:9", "");
        let items = collect(client.stream_generate("gemini-test", request())).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(GenerationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_contain_api_key() {
        let key = "SECRET-KEY-123";
        let client = client("http://127.0.0.1:9", key);

        let items = collect(client.stream_generate("gemini-test", request())).await;
        assert_eq!(items.len(), 1);
        let stream_error = items[0].as_ref().unwrap_err();
        assert!(matches!(stream_error, GenerationError::Transport(_)));
        assert!(!stream_error.to_string().contains(key));
        assert!(!format!("{:?}", stream_error).contains(key));

        let generate_error = client.generate("gemini-test", &request()).await.unwrap_err();
        assert!(!generate_error.to_string().contains(key));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJsonString(
                r#"{"systemInstruction":{"parts":[{"text":"persona"}]}}"#.to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "candidates": [{
                        "content": {
                            "parts": [{ "text": "This is a test response" }],
                            "role": "model"
                        }
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let result = client.generate("gemini-test", &request()).await;

        mock.assert_async().await;
        assert_eq!(
            result.unwrap().text().as_deref(),
            Some("This is a test response")
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_empty_candidates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let result = client.generate("gemini-test", &request()).await;

        mock.assert_async().await;
        assert!(result.unwrap_err().to_string().contains("no candidates"));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_blocked_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let result = client.generate("gemini-test", &request()).await;

        mock.assert_async().await;
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("blocked the prompt"),
            "Error message should contain 'blocked the prompt', got: {}",
            error_msg
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_rate_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(429)
            .with_body(r#"{"error": "Rate limit exceeded"}"#)
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let result = client.generate("gemini-test", &request()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(GenerationError::RateLimited(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_invalid_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let result = client.generate("gemini-test", &request()).await;

        mock.assert_async().await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse JSON"));
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_yields_fragments_in_order() {
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"lo!\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\r\n\r\n",
        );
        let mock = server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let items = collect(client.stream_generate("gemini-test", request())).await;

        mock.assert_async().await;
        let fragments: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        // The empty text part is a fragment; the finish-only event is not
        assert_eq!(fragments, vec!["Hel", "", "lo!"]);
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_http_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let items = collect(client.stream_generate("gemini-test", request())).await;

        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(GenerationError::Status { status, body }) => {
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_stream_malformed_event_ends_stream() {
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}\n\n",
            "data: not-json\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never\"}]}}]}\n\n",
        );
        let mock = server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = client(&server.url(), "test-key");
        let items = collect(client.stream_generate("gemini-test", request())).await;

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "ok");
        assert!(matches!(items[1], Err(GenerationError::Decode(_))));
    }
}
