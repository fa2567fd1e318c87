use std::time::Duration;

use anyhow::Context;
use reqwest::{Method, RequestBuilder, StatusCode};

use eg_core::ports::ContentSourceError;

/// Connection settings for the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Shared request plumbing for the HTTP adapters.
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub(crate) fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> ContentSourceError {
    ContentSourceError::Unavailable(format!("request failed: {}", err))
}

pub(crate) fn decode_error(err: reqwest::Error) -> ContentSourceError {
    ContentSourceError::Unavailable(format!("invalid response body: {}", err))
}

/// Map a non-success status onto the port error kinds. 409 is the one
/// status with dedicated semantics: the content already exists.
pub(crate) fn status_error(status: StatusCode) -> ContentSourceError {
    match status {
        StatusCode::CONFLICT => ContentSourceError::Conflict,
        code if code.is_server_error() => {
            ContentSourceError::Unavailable(format!("server error: {}", code))
        }
        code => ContentSourceError::Unavailable(format!("unexpected status: {}", code)),
    }
}
