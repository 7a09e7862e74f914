// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! One authenticated, logged transport attempt
//!
//! Both dispatch engines send every attempt through [`AttemptSender`], so bearer token
//! injection and per-attempt records behave identically whether a request retries one
//! host or rotates across many.

use std::{fmt, sync::Arc};

use api_client::{
    ApiResult, AttemptOutcome, AttemptRecord, Authenticator, LogicalRequest, RequestLogger,
    Transport, TransportResponse,
};
use reqwest::header::AUTHORIZATION;
use tokio::time::Instant;
use uuid::Uuid;

/// Sends single attempts with authentication and logging applied
pub struct AttemptSender<T, A> {
    transport: T,
    authenticator: A,
    logger: Arc<dyn RequestLogger>,
}

impl<T, A> fmt::Debug for AttemptSender<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptSender").finish_non_exhaustive()
    }
}

impl<T: Transport, A: Authenticator> AttemptSender<T, A> {
    /// Create a sender from its collaborators
    pub fn new(transport: T, authenticator: A, logger: Arc<dyn RequestLogger>) -> Self {
        Self {
            transport,
            authenticator,
            logger,
        }
    }

    /// Send `request` to `url` once and record the outcome
    ///
    /// A token acquisition failure is returned before any transport call and is not
    /// recorded as an attempt.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's or the transport's error unchanged
    pub async fn send(
        &self,
        request_id: Uuid,
        attempt: u32,
        url: &str,
        request: &LogicalRequest,
        endpoint: Option<&str>,
    ) -> ApiResult<TransportResponse> {
        let mut outgoing = request.clone();
        if self.authenticator.requires_auth() {
            let token = self.authenticator.bearer_token().await?;
            outgoing
                .headers
                .insert(AUTHORIZATION.as_str().to_string(), format!("Bearer {token}"));
        }

        let started = Instant::now();
        let result = self.transport.send(url, &outgoing).await;
        let outcome = match &result {
            Ok(response) => AttemptOutcome::Success {
                status: response.status,
            },
            Err(error) => AttemptOutcome::from_error(error),
        };

        let mut record =
            AttemptRecord::new(request_id, attempt, url, &outgoing, outcome, started.elapsed());
        if let Some(name) = endpoint {
            record = record.with_endpoint(name);
        }
        self.logger.record(&record);

        result
    }
}
