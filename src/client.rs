use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::provider::{Credential, Provider, TextStream};
use crate::sse::process_sse;
use crate::types::{CompletionRequest, completion_text, model_ids_from_value};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for Groq's OpenAI-compatible API.
///
/// The client holds no credential; every call takes the session's
/// [`Credential`] so that a key entered mid-session applies immediately.
#[derive(Debug, Clone)]
pub struct Groq {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Groq {
    /// Create a new client against the public endpoint.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url.unwrap_or(DEFAULT_API_URL))?,
            timeout,
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(credential: &Credential) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        bearer.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Send a request, mapping transport failures and error statuses.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(error = %err, "provider request failed");
            return Err(err);
        }
        Ok(response)
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
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_status(status_code, &error_body, request_id, retry_after)
    }

    async fn read_json(response: Response) -> Result<Value> {
        response.json::<Value>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl Provider for Groq {
    async fn list_models(&self, credential: &Credential) -> Result<Vec<String>> {
        let url = self.endpoint("models")?;
        let request = self
            .client
            .get(url)
            .headers(Self::default_headers(credential)?);
        let response = self.execute(request).await?;
        let body = Self::read_json(response).await?;
        let models = model_ids_from_value(&body)?;
        tracing::debug!(count = models.len(), "listed provider models");
        Ok(models)
    }

    async fn stream_completion(
        &self,
        credential: &Credential,
        mut request: CompletionRequest,
    ) -> Result<TextStream> {
        request.stream = true;
        let url = self.endpoint("chat/completions")?;

        let mut headers = Self::default_headers(credential)?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        tracing::debug!(model = %request.model, "starting streaming completion");
        let response = self
            .execute(self.client.post(url).headers(headers).json(&request))
            .await?;

        let chunks = process_sse(response.bytes_stream());
        let text = chunks.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => chunk
                    .text()
                    .filter(|text| !text.is_empty())
                    .map(|text| Ok(text.to_string())),
                Err(err) => Some(Err(err)),
            }
        });
        Ok(Box::pin(text))
    }

    async fn complete(&self, credential: &Credential, mut request: CompletionRequest) -> Result<String> {
        request.stream = false;
        let url = self.endpoint("chat/completions")?;
        tracing::debug!(model = %request.model, "requesting completion");
        let response = self
            .execute(
                self.client
                    .post(url)
                    .headers(Self::default_headers(credential)?)
                    .json(&request),
            )
            .await?;
        let body = Self::read_json(response).await?;
        completion_text(&body)
    }
}

/// Parses the base URL, ensuring a trailing slash so joins append paths.
fn parse_base_url(base_url: &str) -> Result<Url> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{base_url}/"))?)
    }
}

/// Map an HTTP error status and body to the matching error variant.
fn error_from_status(
    status_code: u16,
    error_body: &str,
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

    let detail = serde_json::from_str::<ErrorResponse>(error_body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_message = detail
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| error_body.to_string());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());

    match status_code {
        400 | 422 => Error::bad_request(error_message, error_param),
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
