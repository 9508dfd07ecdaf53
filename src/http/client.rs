//! HTTP client shared by all source adapters
//!
//! Wraps `reqwest` with:
//! - base URL joining
//! - credential application through [`Authenticator`]
//! - classification of failures into source errors
//! - request/response tracing (payloads only at `trace`)
//!
//! No retries: a failed call surfaces to the caller
//! immediately and the caller's failure policy decides what happens next.

use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Name of the external system, used in errors and logs
    pub source_name: String,
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            source_name: "http".to_string(),
            base_url: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("payroll-recon/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the source name
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.config.source_name = name.into();
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in insertion order
    pub query: Vec<(String, String)>,
    /// Request body (JSON)
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A decoded JSON response together with its headers
#[derive(Debug)]
pub struct JsonResponse<T> {
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: T,
}

impl<T> JsonResponse<T> {
    /// Value of a response header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP client bound to one external system
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
}

impl HttpClient {
    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::new(auth_config),
        })
    }

    /// Name of the external system this client talks to
    pub fn source_name(&self) -> &str {
        &self.config.source_name
    }

    /// Send a request and return the raw response on a success status
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let source = self.source_name();

        let mut req = self.client.request(method.clone(), &full_url);

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        if let Some(ref body) = config.body {
            trace!(source, %method, url = %full_url, body = %body, "request payload");
            req = req.json(body);
        }

        req = self.authenticator.apply(req);

        debug!(source, %method, url = %full_url, "sending request");
        let started = Instant::now();

        let response = req.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request to {full_url} timed out")
            } else if e.is_connect() {
                format!("could not connect to {full_url}: {e}")
            } else {
                format!("request to {full_url} failed: {e}")
            };
            Error::unavailable(source, reason)
        })?;

        let status = response.status();
        debug!(
            source,
            %method,
            url = %full_url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            trace!(source, status = status.as_u16(), body = %body, "error payload");
            return Err(Error::status(source, status.as_u16(), truncate(&body, 500)));
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body, keeping the headers
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<JsonResponse<T>> {
        let response = self.request(method, url, config).await?;
        let headers = response.headers().clone();

        let text = response.text().await.map_err(|e| {
            Error::unavailable(self.source_name(), format!("failed to read response body: {e}"))
        })?;
        trace!(source = self.source_name(), body = %text, "response payload");

        let body = serde_json::from_str(&text).map_err(|e| {
            Error::invalid_data(self.source_name(), format!("unexpected response shape: {e}"))
        })?;

        Ok(JsonResponse {
            headers,
            body,
        })
    }

    /// GET and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<T> {
        Ok(self.send_json(Method::GET, url, config).await?.body)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<T> {
        Ok(self
            .send_json(Method::POST, url, RequestConfig::new().json(body))
            .await?
            .body)
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                if path.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}/{path}")
                }
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", &self.authenticator.config().scheme())
            .finish_non_exhaustive()
    }
}

/// Shorten an upstream error body for error messages
fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let cut: String = body.chars().take(max_chars).collect();
    format!("{cut}...")
}
