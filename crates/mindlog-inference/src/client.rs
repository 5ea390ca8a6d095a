// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat completions endpoint.
//!
//! Provides [`ChatClient`] which handles request construction,
//! authentication, admission through the shared scheduler, transient error
//! retry, and classification of every failure into [`InferenceFailure`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mindlog_core::{Completion, InferenceFailure, InferenceProvider, InferenceRequest, MindlogError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::{debug, warn};

use crate::limiter::AdmissionScheduler;
use crate::retry::RetryPolicy;
use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Path appended to the configured base URL.
const COMPLETIONS_PATH: &str = "/chat/completions";

/// HTTP client for chat completion calls.
///
/// Cheap to clone; clones share the connection pool and the admission scheduler.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    scheduler: Arc<AdmissionScheduler>,
    retry: RetryPolicy,
}

impl ChatClient {
    /// Creates a client posting to `{base_url}/chat/completions` with a bearer key.
    pub fn new(
        base_url: &str,
        api_key: &str,
        scheduler: Arc<AdmissionScheduler>,
        retry: RetryPolicy,
    ) -> Result<Self, MindlogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| MindlogError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MindlogError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            scheduler,
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn scheduler(&self) -> &Arc<AdmissionScheduler> {
        &self.scheduler
    }

    /// Sends one request, resending on transient failures.
    ///
    /// Every wire attempt, including resends, passes through the scheduler.
    pub async fn complete(&self, request: &InferenceRequest) -> Result<Completion, MindlogError> {
        let body = ChatCompletionRequest::from(request);
        let body = &body;
        self.retry
            .run(move |attempt| async move {
                self.scheduler
                    .schedule(|| self.send_once(body, request.timeout, attempt))
                    .await
            })
            .await
    }

    async fn send_once(
        &self,
        body: &ChatCompletionRequest,
        timeout: Duration,
        attempt: u32,
    ) -> Result<Completion, MindlogError> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, timeout))?;

        let status = response.status();
        debug!(status = %status, attempt, model = %body.model, "completion response received");

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| classify_transport_error(&e, timeout))?;
            let parsed: ChatCompletionResponse = serde_json::from_str(&text)
                .map_err(|e| MindlogError::Decode(format!("malformed completion envelope: {e}")))?;
            return parsed
                .first_content()
                .map(|content| Completion { content })
                .ok_or_else(|| MindlogError::Decode("completion has no message content".into()));
        }

        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, attempt, "inference endpoint returned an error");
        Err(classify_status(status.as_u16(), retry_after, &body).into())
    }
}

#[async_trait]
impl InferenceProvider for ChatClient {
    async fn complete(&self, request: InferenceRequest) -> Result<Completion, MindlogError> {
        ChatClient::complete(self, &request).await
    }
}

/// Maps a non-2xx status into the failure taxonomy.
pub fn classify_status(status: u16, retry_after: Option<Duration>, body: &str) -> InferenceFailure {
    match status {
        429 => InferenceFailure::RateLimited { retry_after },
        500..=599 => InferenceFailure::Server { status },
        _ => {
            let message = serde_json::from_str::<ApiErrorResponse>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            InferenceFailure::Client { status, message }
        }
    }
}

fn classify_transport_error(e: &reqwest::Error, timeout: Duration) -> MindlogError {
    if e.is_timeout() {
        InferenceFailure::Timeout { duration: timeout }.into()
    } else {
        InferenceFailure::Network(e.to_string()).into()
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::LimiterSettings;
    use mindlog_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, max_retries: u32) -> ChatClient {
        let scheduler = Arc::new(AdmissionScheduler::new(LimiterSettings {
            reservoir: 100,
            refill_interval: Duration::from_secs(1),
            max_concurrent: 2,
            min_spacing: Duration::ZERO,
            high_water: 10,
        }));
        ChatClient::new(
            base_url,
            "test-api-key",
            scheduler,
            RetryPolicy::new(max_retries, Duration::from_millis(1)),
        )
        .unwrap()
    }

    fn test_request(timeout: Duration) -> InferenceRequest {
        InferenceRequest {
            messages: vec![ChatMessage::system("Answer in JSON."), ChatMessage::user("Hello")],
            model: "test-model".into(),
            temperature: 0.7,
            max_tokens: 512,
            timeout,
            json_object: true,
        }
    }

    fn success_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn complete_success_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "max_tokens": 512,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("{\"ok\":true}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/v1/", server.uri()), 2);
        let completion = client
            .complete(&test_request(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(completion.content, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn rate_limit_maps_with_retry_after_and_is_not_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client
            .complete(&test_request(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MindlogError::Inference(InferenceFailure::RateLimited {
                retry_after: Some(d)
            }) if d == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn server_error_maps_to_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client
            .complete(&test_request(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MindlogError::Inference(InferenceFailure::Server { status: 503 })
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn client_error_carries_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "unknown model", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client
            .complete(&test_request(Duration::from_secs(5)))
            .await
            .unwrap_err();
        match err {
            MindlogError::Inference(InferenceFailure::Client { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "unknown model");
            }
            other => panic!("expected client failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_is_resent_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("fast")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let completion = client
            .complete(&test_request(Duration::from_millis(100)))
            .await
            .unwrap();
        assert_eq!(completion.content, "fast");
    }

    #[tokio::test]
    async fn persistent_timeout_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("late"))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client
            .complete(&test_request(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MindlogError::Inference(InferenceFailure::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn connection_refused_is_network_failure() {
        // Nothing listens on port 9 on the loopback interface in test environments.
        let client = test_client("http://127.0.0.1:9", 0);
        let err = client
            .complete(&test_request(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                MindlogError::Inference(InferenceFailure::Network(_) | InferenceFailure::Timeout { .. })
            ),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn empty_choices_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let err = client
            .complete(&test_request(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, MindlogError::Decode(_)));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(502, None, ""),
            InferenceFailure::Server { status: 502 }
        ));
        assert!(matches!(
            classify_status(404, None, "not found"),
            InferenceFailure::Client { status: 404, .. }
        ));
    }
}
