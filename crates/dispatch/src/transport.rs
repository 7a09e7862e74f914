// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport over reqwest
//!
//! [`HttpTransport`] performs exactly one attempt per call. It never retries and never
//! classifies; it only maps what happened on the wire into an [`ApiError`].

use std::time::Duration;

use api_client::{ApiError, ApiResult, HttpMethod, LogicalRequest, Transport, TransportResponse};
use reqwest::{Client, Method, header::ACCEPT};
use serde_json::Value;
use tracing::trace;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("scan-dispatch/", env!("CARGO_PKG_VERSION"));

/// Single-attempt JSON transport built on a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with a per-attempt timeout and user agent
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built
    pub fn new(timeout: Duration, user_agent: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_reqwest_error(error: &reqwest::Error) -> ApiError {
    if error.is_builder() {
        ApiError::validation(format!("invalid request: {error}"))
    } else if error.is_timeout() {
        ApiError::timeout(error)
    } else {
        ApiError::transport(error)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, url: &str, request: &LogicalRequest) -> ApiResult<TransportResponse> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(ACCEPT, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| map_reqwest_error(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| map_reqwest_error(&e))?;

        trace!(url, status = status.as_u16(), bytes = text.len(), "response received");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &text));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                ApiError::invalid_response(format!("response from {url} is not JSON: {e}"))
            })?
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}
