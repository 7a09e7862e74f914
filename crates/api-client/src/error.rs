// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for ledger API requests
//!
//! Every failure that crosses the transport boundary is turned into one of the closed
//! [`ApiError`] variants, so retry decisions pattern-match on a known shape. Errors are
//! surfaced to callers verbatim: the HTTP status and machine-readable code of the last
//! observed failure are never wrapped away.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for API requests
pub type ApiResult<T> = Result<T, ApiError>;

/// Maximum number of body characters kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors produced by API requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// No response was received (DNS, connect, TLS, timeout)
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// A response was received with an error status
    #[error("Service error {status}{}: {message}", code_suffix(.code.as_deref()))]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// There was nothing to send the request to
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The caller-supplied request was malformed and never reached the network
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A success response whose body could not be decoded
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },
}

impl ApiError {
    /// Create a transport error
    pub fn transport<T: ToString>(message: T) -> Self {
        Self::Transport {
            message: message.to_string(),
            timed_out: false,
        }
    }

    /// Create a transport error for an attempt that timed out
    pub fn timeout<T: ToString>(message: T) -> Self {
        Self::Transport {
            message: message.to_string(),
            timed_out: true,
        }
    }

    /// Create a service error from its parts
    pub fn service<T: ToString>(status: u16, code: Option<&str>, message: T) -> Self {
        Self::Service {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation<T: ToString>(message: T) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Build a service error from an error status and the raw response body
    ///
    /// The machine-readable code is read from a top-level `code` field, falling back to
    /// `error.code`. The message prefers `cause`, then `message`, then `error` (either a
    /// string or an object with a `message`), then the raw body text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();

        let code = parsed.as_ref().and_then(|value| {
            value
                .get("code")
                .and_then(Value::as_str)
                .or_else(|| value.pointer("/error/code").and_then(Value::as_str))
                .map(str::to_string)
        });

        let message = parsed
            .as_ref()
            .and_then(|value| {
                value
                    .get("cause")
                    .and_then(Value::as_str)
                    .or_else(|| value.get("message").and_then(Value::as_str))
                    .or_else(|| value.get("error").and_then(Value::as_str))
                    .or_else(|| value.pointer("/error/message").and_then(Value::as_str))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| truncate(body.trim()));

        let message = if message.is_empty() {
            format!("HTTP {status}")
        } else {
            message
        };

        Self::Service {
            status,
            code,
            message,
        }
    }

    /// HTTP status of the failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code carried by the response, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether no response was received at all
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether the failure was a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }

    /// Whether the failure indicates rejected credentials (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        truncated.push_str("...");
        truncated
    }
}
