//! A model provider for the Google generative-language (Gemini) API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use verdant_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelReply, ModelRequest,
};

pub use config::{GeminiConfig, GeminiConfigBuilder};

const API_KEY_HEADER: &str = "x-goog-api-key";

// Bounds the controller's busy state; the upstream API has no inherent
// deadline for long generations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let gemini_req = proto::create_request(req);
        let resp_fut = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.base_url, self.config.model
            ))
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&gemini_req)
            .send();

        async move {
            trace!("sending a request with {} messages", gemini_req.contents.len());
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    error!("transport error: {err}");
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                return Err(error_from_status(status, resp.text().await.ok()));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            let body: proto::GenerateContentResponse = match resp.json().await
            {
                Ok(body) => body,
                Err(err) => {
                    return Err(Error::new(
                        format!("Malformed response: {err}"),
                        ErrorKind::Other,
                    ));
                }
            };

            let block_reason = body
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.as_deref());
            if let Some(reason) = block_reason {
                return Err(Error::new(
                    format!("Prompt was blocked: {reason}"),
                    ErrorKind::Moderated,
                ));
            }

            let Some(text) = body.reply_text() else {
                return Err(Error::new(
                    "Response contains no candidates",
                    ErrorKind::Other,
                ));
            };

            trace!("got a reply of {} bytes", text.len());
            Ok(ModelReply::new(text))
        }
    }
}

fn error_from_status(status: StatusCode, body: Option<String>) -> Error {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::InvalidCredential
        }
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    };
    // Prefer the server's own error message when it sends one.
    let message = body
        .as_deref()
        .and_then(|body| {
            serde_json::from_str::<proto::ErrorResponse>(body).ok()
        })
        .map(|resp| resp.error.message)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| format!("API returned status {status}"));
    error!("request failed ({status}): {message}");
    Error::new(message, kind)
}
