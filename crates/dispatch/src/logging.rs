// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Default request logger emitting `tracing` events

use api_client::{AttemptOutcome, AttemptRecord, RequestLogger};
use tracing::{debug, warn};

/// Emits one structured event per attempt
///
/// Successes are logged at `debug`, failures at `warn`. Records are already redacted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn record(&self, record: &AttemptRecord) {
        let elapsed_ms = u64::try_from(record.elapsed.as_millis()).unwrap_or(u64::MAX);
        let endpoint = record.endpoint.as_deref().unwrap_or("-");

        match &record.outcome {
            AttemptOutcome::Success { status } => debug!(
                request_id = %record.request_id,
                attempt = record.attempt,
                endpoint,
                method = %record.method,
                url = %record.url,
                status,
                elapsed_ms,
                "attempt succeeded"
            ),
            AttemptOutcome::Failure {
                status,
                code,
                message,
            } => warn!(
                request_id = %record.request_id,
                attempt = record.attempt,
                endpoint,
                method = %record.method,
                url = %record.url,
                status = ?status,
                code = code.as_deref().unwrap_or("-"),
                elapsed_ms,
                error = %message,
                "attempt failed"
            ),
        }
    }
}
