use std::future::Future;
use std::pin::Pin;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::config::TutorApiConfig;
use crate::error::{parse_error_message, TutorApiError};
use crate::headers::build_headers;
use crate::payload::{ChatCompletionRequest, RequestMessage};
use crate::retry::{is_retryable_http_error, is_retryable_transport_error, RetryPolicy};
use crate::url::normalize_chat_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

/// Response body as an ordered stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TutorApiError>> + Send>>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct TutorApiClient {
    http: Client,
    config: TutorApiConfig,
    retry: RetryPolicy,
}

impl TutorApiClient {
    pub fn new(config: TutorApiConfig) -> Result<Self, TutorApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &TutorApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    /// Wrap `messages` in a request carrying the configured model and sampling.
    pub fn chat_request(&self, messages: Vec<RequestMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            stream: true,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            messages,
        }
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, TutorApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                TutorApiError::InvalidHeader {
                    name: key.clone(),
                    reason: "invalid header name",
                }
            })?;
            let value = HeaderValue::from_str(&value).map_err(|_| TutorApiError::InvalidHeader {
                name: key.clone(),
                reason: "invalid header value",
            })?;
            out.insert(name, value);
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::RequestBuilder, TutorApiError> {
        let headers = self.build_headers(None)?;
        let mut payload = request.clone();
        payload.stream = true;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    pub async fn send_with_retry(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, TutorApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;
        let mut attempt = 0;

        loop {
            if is_cancelled(cancellation) {
                return Err(TutorApiError::Cancelled);
            }

            let response = await_or_cancel(self.build_request(request)?.send(), cancellation).await?;

            let retry_reason = match response {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if !is_retryable_http_error(status.as_u16(), &body) {
                        return Err(TutorApiError::Status(status, message));
                    }
                    if !self.retry.has_budget(attempt) {
                        return Err(TutorApiError::Status(status, message));
                    }
                    format!("HTTP {status}")
                }
                Err(error) => {
                    let retryable = is_retryable_transport_error(&error);
                    last_error = Some(error.to_string());
                    if !retryable {
                        return Err(TutorApiError::Request(error));
                    }
                    if !self.retry.has_budget(attempt) {
                        return Err(TutorApiError::RetryExhausted {
                            status: last_status,
                            last_error,
                        });
                    }
                    "transport failure".to_owned()
                }
            };

            let delay = self.retry.delay_for(attempt);
            tracing::debug!(
                attempt = attempt + 1,
                reason = %retry_reason,
                delay_ms = delay.as_millis() as u64,
                "retrying chat completion request"
            );
            await_or_cancel(tokio::time::sleep(delay), cancellation).await?;
            attempt += 1;
        }
    }

    /// Send `request` and hand back the raw body chunks in arrival order.
    ///
    /// The returned stream owns the connection; dropping it releases it.
    pub async fn open_stream(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ByteStream, TutorApiError> {
        let response = self.send_with_retry(request, cancellation).await?;
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TutorApiError::from));
        Ok(Box::pin(bytes))
    }
}

pub fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

/// Await `future`, giving up with [`TutorApiError::Cancelled`] once the
/// signal is raised.
pub async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, TutorApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(TutorApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(TutorApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
