use crate::config::UpstreamConfig;
use crate::types::{GeminiError, GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;
use tracing::debug;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Failure reported by the remote generation service.
///
/// `status` is the HTTP status the service answered with, if it answered at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn message_or_default(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_or_default())
    }
}

/// Text generation capability of the remote service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply for `message` with `model`. `Ok(None)` means the
    /// service answered without any text.
    async fn generate(&self, model: &str, message: &str) -> Result<Option<String>, RemoteError>;
}

/// Gemini `generateContent` client bound to a single API key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &UpstreamConfig, api_key: SecretString) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model_path(model))
    }
}

/// Resource path of a model; bare names live under `models/`.
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, model: &str, message: &str) -> Result<Option<String>, RemoteError> {
        let url = self.endpoint(model);
        debug!("Calling {} with API key (redacted)", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&GenerateContentRequest::user_text(message))
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::transport(format!("Invalid response from upstream: {}", e)))?;

        Ok(body.text())
    }
}

/// Build a [`RemoteError`] from a non-2xx upstream answer.
fn error_from_body(status: reqwest::StatusCode, body: &str) -> RemoteError {
    let message = match serde_json::from_str::<GeminiError>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if !body.trim().is_empty() => Some(body.trim().to_string()),
        Err(_) => None,
    }
    .filter(|m| !m.is_empty())
    .or_else(|| status.canonical_reason().map(str::to_string));

    RemoteError {
        status: Some(status.as_u16()),
        message,
    }
}
