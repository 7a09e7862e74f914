// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Logical request model
//!
//! A [`LogicalRequest`] is what a generated per-operation client hands to the dispatch
//! layer: a method, a path (or absolute URL), an optional JSON body and extra headers.
//! It is transient per call; the only mutation it ever sees is the idempotency key
//! rewrite applied before a retry.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiError, ApiResult};

// Idempotency defaults
const DEFAULT_IDEMPOTENCY_FIELD: &str = "commandId";
const DEFAULT_IDEMPOTENCY_SUFFIX: &str = "-retry";

/// Whether `path_or_url` starts with a URL scheme such as `https://`
///
/// A `://` inside a query string does not count.
pub fn is_absolute_url(path_or_url: &str) -> bool {
    path_or_url.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// HTTP methods used by the ledger APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the method carries a body whose idempotency key is rewritten on retry
    pub const fn rewrites_idempotency_key(self) -> bool {
        matches!(self, Self::Post | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logical request, possibly sent several times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Base-relative path (with query) or absolute URL
    pub path_or_url: String,
    /// Optional JSON payload
    pub body: Option<Value>,
    /// Extra headers sent with every attempt
    pub headers: BTreeMap<String, String>,
}

impl LogicalRequest {
    /// Create a request without a body
    pub fn new(method: HttpMethod, path_or_url: impl Into<String>) -> Self {
        Self {
            method,
            path_or_url: path_or_url.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Create a GET request
    pub fn get(path_or_url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path_or_url)
    }

    /// Create a POST request with a JSON body
    pub fn post(path_or_url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path_or_url).with_body(body)
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach an extra header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Whether the path is an absolute URL rather than a base-relative path
    pub fn is_absolute(&self) -> bool {
        is_absolute_url(&self.path_or_url)
    }

    /// Reject requests that cannot be sent, before touching the network
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the path is empty or contains whitespace, or
    /// a GET/DELETE request carries a body
    pub fn validate(&self) -> ApiResult<()> {
        let path = self.path_or_url.trim();
        if path.is_empty() {
            return Err(ApiError::validation("request path cannot be empty"));
        }

        if path.chars().any(char::is_whitespace) {
            return Err(ApiError::validation(format!(
                "request path '{path}' contains whitespace"
            )));
        }

        if self.body.is_some() && matches!(self.method, HttpMethod::Get | HttpMethod::Delete) {
            return Err(ApiError::validation(format!(
                "{} request to '{path}' cannot carry a body",
                self.method
            )));
        }

        Ok(())
    }
}

/// Idempotency-style key rewritten before every retry
///
/// The upstream service deduplicates submissions by this key. A resubmission of a
/// request it may have partially processed must not carry the original value, or it
/// is silently dropped or rejected as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyKey {
    /// JSON field name holding the key, matched at any depth
    pub field: String,
    /// Suffix appended to the current value on each retry
    pub suffix: String,
}

impl Default for IdempotencyKey {
    fn default() -> Self {
        Self {
            field: DEFAULT_IDEMPOTENCY_FIELD.to_string(),
            suffix: DEFAULT_IDEMPOTENCY_SUFFIX.to_string(),
        }
    }
}

impl IdempotencyKey {
    /// Create a key rule for the given field and suffix
    pub fn new(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            suffix: suffix.into(),
        }
    }

    /// Rewrite the key in a request about to be retried
    ///
    /// Only POST and PATCH bodies are touched. Returns the number of fields rewritten.
    pub fn prepare_retry(&self, request: &mut LogicalRequest) -> usize {
        if !request.method.rewrites_idempotency_key() {
            return 0;
        }
        match request.body.as_mut() {
            Some(body) => self.rewrite(body),
            None => 0,
        }
    }

    /// Append the suffix to every string value stored under the key field
    pub fn rewrite(&self, value: &mut Value) -> usize {
        match value {
            Value::Object(map) => map
                .iter_mut()
                .map(|(name, child)| match child {
                    Value::String(current) if *name == self.field => {
                        current.push_str(&self.suffix);
                        1
                    }
                    other => self.rewrite(other),
                })
                .sum(),
            Value::Array(items) => items.iter_mut().map(|item| self.rewrite(item)).sum(),
            _ => 0,
        }
    }
}
