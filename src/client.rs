use std::env;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_BYTES,
    STREAM_FRAGMENTS,
};
use crate::sse::process_sse;
use crate::types::ChatCompletionRequest;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A lazy, finite sequence of text fragments of one assistant response.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Something that turns a chat-completion request into streamed fragments.
///
/// [`OpenAi`] talks to the hosted service; tests substitute scripted
/// implementations.
///
/// ```
/// # use palaver::{ChatCompletionRequest, CompletionService, FragmentStream, Message, Result};
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl CompletionService for Echo {
///     async fn stream(&self, request: ChatCompletionRequest) -> Result<FragmentStream> {
///         let last = request
///             .messages
///             .last()
///             .map(|m| m.content.clone())
///             .unwrap_or_default();
///         Ok(Box::pin(futures::stream::iter(vec![Ok(last)])))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// use futures::StreamExt;
/// let request = ChatCompletionRequest::basic(&[Message::user("ping")]);
/// let fragments: Vec<_> = Echo.stream(request).await.unwrap().collect().await;
/// assert_eq!(fragments.len(), 1);
/// # });
/// ```
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the request and return the response as a stream of fragments.
    ///
    /// Errors that happen before the first byte arrives are returned
    /// directly; errors after that are items of the stream.
    async fn stream(&self, request: ChatCompletionRequest) -> Result<FragmentStream>;
}

/// Client for an OpenAI-compatible chat-completion API.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable; the base URL may be overridden with
    /// OPENAI_BASE_URL.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_VAR).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_VAR} environment variable not set"
                ))
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        // The whole-request timeout would cut long streams short; only bound connecting.
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        let mut base_url = base_url
            .or_else(|| env::var(BASE_URL_VAR).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and fragment.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}chat/completions", self.base_url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_status(status_code, &error_body, request_id, retry_after)
    }
}

#[async_trait::async_trait]
impl CompletionService for OpenAi {
    async fn stream(&self, request: ChatCompletionRequest) -> Result<FragmentStream> {
        let mut request = request;
        request.stream = true;

        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.default_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(error = %err, "chat completion request rejected");
            return Err(err);
        }

        let logger = self.logger.clone();
        let fragments = process_sse(response.bytes_stream()).map(move |chunk| {
            let fragment = chunk?.fragment().to_string();
            STREAM_FRAGMENTS.click();
            STREAM_BYTES.count(fragment.len() as u64);
            if let Some(logger) = &logger {
                logger.log_fragment(&fragment);
            }
            Ok(fragment)
        });
        Ok(Box::pin(fragments))
    }
}

/// Map an unsuccessful HTTP status and its body to an [`Error`].
fn error_from_status(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());
    let error_message = detail
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}
