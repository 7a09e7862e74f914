// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Retry classification of request failures
//!
//! [`ErrorClassifier`] is the single authority on whether a failure is worth another
//! attempt. Neither the single-endpoint executor nor the multi-endpoint dispatcher
//! re-derives this decision.

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Machine code returned while a serving node has a stale view of contract synchronizers
pub const UNKNOWN_CONTRACT_SYNCHRONIZERS: &str = "UNKNOWN_CONTRACT_SYNCHRONIZERS";

/// Machine code returned by server-side admission control
pub const SEQUENCER_BACKPRESSURE: &str = "SEQUENCER_BACKPRESSURE";

/// Retry-worthiness of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Another attempt (same host or another endpoint) may succeed
    Retryable,
    /// The failure is terminal for this logical request
    Fatal,
}

impl Classification {
    /// Whether another attempt is worthwhile
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable)
    }
}

/// Which engine is asking for a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchContext {
    /// Retrying one fixed base URL
    SingleEndpoint,
    /// Rotating across redundantly published endpoints
    MultiEndpoint,
}

/// Pure mapping from failures to [`Classification`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Create a new classifier
    pub const fn new() -> Self {
        Self
    }

    /// Classify a failure observed in the given dispatch context
    ///
    /// Rules, first match wins:
    /// 1. no HTTP status (transport failure) is retryable
    /// 2. any 5xx is retryable
    /// 3. 400 with `UNKNOWN_CONTRACT_SYNCHRONIZERS` is retryable
    /// 4. 409 with `SEQUENCER_BACKPRESSURE` is retryable
    /// 5. 429 and 408 are retryable when rotating across endpoints
    /// 6. everything else is fatal
    pub fn classify(self, error: &ApiError, context: DispatchContext) -> Classification {
        match error {
            ApiError::Transport { .. } => Classification::Retryable,
            ApiError::Service { status, code, .. } => {
                Self::classify_status(*status, code.as_deref(), context)
            }
            ApiError::Configuration { .. }
            | ApiError::Validation { .. }
            | ApiError::InvalidResponse { .. } => Classification::Fatal,
        }
    }

    /// Classify an HTTP status and optional machine code
    pub fn classify_status(
        status: u16,
        code: Option<&str>,
        context: DispatchContext,
    ) -> Classification {
        match (status, code, context) {
            (500..=599, _, _)
            | (400, Some(UNKNOWN_CONTRACT_SYNCHRONIZERS), _)
            | (409, Some(SEQUENCER_BACKPRESSURE), _)
            | (408 | 429, _, DispatchContext::MultiEndpoint) => Classification::Retryable,
            _ => Classification::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: DispatchContext = DispatchContext::SingleEndpoint;
    const MULTI: DispatchContext = DispatchContext::MultiEndpoint;

    fn classify(error: &ApiError, context: DispatchContext) -> Classification {
        ErrorClassifier::new().classify(error, context)
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert_eq!(
            classify(&ApiError::transport("connection refused"), SINGLE),
            Classification::Retryable
        );
        assert_eq!(
            classify(&ApiError::timeout("deadline elapsed"), MULTI),
            Classification::Retryable
        );
    }

    #[test]
    fn server_errors_are_retryable() {
        for status in [500, 502, 503, 504, 599] {
            let error = ApiError::service(status, None, "boom");
            assert!(classify(&error, SINGLE).is_retryable(), "status {status}");
            assert!(classify(&error, MULTI).is_retryable(), "status {status}");
        }
    }

    #[test]
    fn known_transient_codes_are_retryable() {
        let stale = ApiError::service(400, Some(UNKNOWN_CONTRACT_SYNCHRONIZERS), "stale");
        assert!(classify(&stale, SINGLE).is_retryable());

        let backpressure = ApiError::service(409, Some(SEQUENCER_BACKPRESSURE), "busy");
        assert!(classify(&backpressure, SINGLE).is_retryable());
    }

    #[test]
    fn codes_only_count_with_their_status() {
        let wrong_status = ApiError::service(409, Some(UNKNOWN_CONTRACT_SYNCHRONIZERS), "x");
        assert_eq!(classify(&wrong_status, MULTI), Classification::Fatal);

        let plain_conflict = ApiError::service(409, Some("DUPLICATE_COMMAND"), "dup");
        assert_eq!(classify(&plain_conflict, MULTI), Classification::Fatal);

        let plain_bad_request = ApiError::service(400, None, "bad");
        assert_eq!(classify(&plain_bad_request, MULTI), Classification::Fatal);
    }

    #[test]
    fn rate_limits_rotate_only_across_endpoints() {
        for status in [408, 429] {
            let error = ApiError::service(status, None, "slow down");
            assert_eq!(classify(&error, SINGLE), Classification::Fatal);
            assert_eq!(classify(&error, MULTI), Classification::Retryable);
        }
    }

    #[test]
    fn everything_else_is_fatal() {
        for status in [401, 403, 404, 422] {
            let error = ApiError::service(status, None, "no");
            assert_eq!(classify(&error, MULTI), Classification::Fatal);
        }
        assert_eq!(
            classify(&ApiError::configuration("no endpoints"), MULTI),
            Classification::Fatal
        );
        assert_eq!(
            classify(&ApiError::validation("empty path"), SINGLE),
            Classification::Fatal
        );
        assert_eq!(
            classify(&ApiError::invalid_response("not json"), MULTI),
            Classification::Fatal
        );
    }
}
