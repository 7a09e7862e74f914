// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-attempt log records
//!
//! One [`AttemptRecord`] is produced after every transport attempt, successful or not,
//! and handed to the configured request logger. Records are redacted at construction so
//! no logger implementation ever sees credentials.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{ApiError, HttpMethod, LogicalRequest};

/// Placeholder written in place of redacted values
pub const REDACTED: &str = "[REDACTED]";

/// Body fields and headers whose values are never recorded (matched case-insensitively)
const SENSITIVE_KEYS: &[&str] = &[
    "authorization",
    "token",
    "access_token",
    "accesstoken",
    "refresh_token",
    "client_secret",
    "secret",
    "password",
    "privatekey",
    "private_key",
    "x-api-key",
];

/// Result of one transport attempt, as seen by a logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum AttemptOutcome {
    /// The attempt returned a success status
    Success { status: u16 },
    /// The attempt failed
    Failure {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
}

impl AttemptOutcome {
    /// Build a failure outcome from an error
    pub fn from_error(error: &ApiError) -> Self {
        Self::Failure {
            status: error.status(),
            code: error.code().map(str::to_string),
            message: error.to_string(),
        }
    }

    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Redacted record of one transport attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Correlation id shared by every attempt of one logical request
    pub request_id: Uuid,
    /// 1-based attempt number within the logical request
    pub attempt: u32,
    /// Name of the endpoint the attempt targeted, when rotating across a pool
    pub endpoint: Option<String>,
    /// HTTP method
    pub method: HttpMethod,
    /// Full URL the attempt was sent to
    pub url: String,
    /// Request headers, credentials redacted
    pub headers: BTreeMap<String, String>,
    /// Request body, credentials redacted
    pub body: Option<Value>,
    /// What happened
    pub outcome: AttemptOutcome,
    /// Wall-clock duration of the attempt
    pub elapsed: Duration,
    /// When the attempt completed
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Build a redacted record for an attempt of `request` sent to `url`
    pub fn new(
        request_id: Uuid,
        attempt: u32,
        url: &str,
        request: &LogicalRequest,
        outcome: AttemptOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            request_id,
            attempt,
            endpoint: None,
            method: request.method,
            url: url.to_string(),
            headers: redact_headers(&request.headers),
            body: request.body.as_ref().map(redact_value),
            outcome,
            elapsed,
            recorded_at: Utc::now(),
        }
    }

    /// Tag the record with the endpoint name it targeted
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|sensitive| key == *sensitive)
}

/// Copy headers, replacing credential values with [`REDACTED`]
pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive(name) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Copy a JSON value, replacing credential fields at any depth with [`REDACTED`]
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| {
                    let child = if is_sensitive(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(child)
                    };
                    (key.clone(), child)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}
