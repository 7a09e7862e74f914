// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rotation across redundantly published endpoints
//!
//! Where the single-endpoint executor retries one host with a delay, the dispatcher
//! moves on immediately: each endpoint gets one attempt, a retryable failure marks it
//! failed in the shared pool, and the next healthy endpoint is tried. The first
//! endpoint to succeed becomes sticky for subsequent requests.

use std::sync::{Arc, Mutex};

use api_client::{
    ApiError, ApiResult, Authenticator, DispatchContext, ErrorClassifier, LogicalRequest,
    Transport, TransportResponse,
};
use shared_types::Endpoint;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::{
    attempt::AttemptSender,
    path::PathRewriter,
    pool::{EndpointPool, lock},
};

/// Whether `index` still refers to `endpoint`; the pool may be refreshed mid-request
fn still_holds(pool: &EndpointPool, index: usize, endpoint: &Endpoint) -> bool {
    let holds = pool.endpoint(index) == Some(endpoint);
    if !holds {
        debug!(endpoint = endpoint.name(), "endpoint pool changed during attempt");
    }
    holds
}

/// Sends one logical request across an [`EndpointPool`]
#[derive(Debug)]
pub struct MultiEndpointDispatcher<T, A> {
    sender: Arc<AttemptSender<T, A>>,
    classifier: ErrorClassifier,
    rewriter: PathRewriter,
}

impl<T: Transport, A: Authenticator> MultiEndpointDispatcher<T, A> {
    /// Create a dispatcher sending through `sender`
    pub fn new(sender: Arc<AttemptSender<T, A>>, rewriter: PathRewriter) -> Self {
        Self {
            sender,
            classifier: ErrorClassifier::new(),
            rewriter,
        }
    }

    /// Dispatch `request` across `pool`, trying at most `max_attempts` endpoints
    ///
    /// The attempt count is capped at the pool size. When every endpoint is marked
    /// failed the marks are cleared and rotation starts over. A fatal error is returned
    /// immediately; otherwise the last error is returned once attempts run out. An
    /// absolute URL that cannot be reduced to a base-relative path is sent once, as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] for an empty pool, the first fatal error, or
    /// the last retryable error
    #[instrument(
        skip_all,
        fields(
            request_id = tracing::field::Empty,
            method = %request.method,
            path = %request.path_or_url,
        )
    )]
    pub async fn dispatch(
        &self,
        request: LogicalRequest,
        pool: &Mutex<EndpointPool>,
        max_attempts: usize,
    ) -> ApiResult<TransportResponse> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let (pool_size, bases) = {
            let mut pool = lock(pool);
            if pool.maybe_reset(Instant::now()) {
                debug!("endpoint reset window elapsed, failure marks cleared");
            }
            (pool.len(), pool.base_urls())
        };

        if pool_size == 0 {
            error!("no endpoints configured");
            return Err(ApiError::configuration("endpoint pool is empty"));
        }

        let Some(suffix) = self.rewriter.to_relative(&request.path_or_url, &bases) else {
            debug!(url = %request.path_or_url, "URL matches no endpoint, sending directly");
            return self
                .sender
                .send(request_id, 1, &request.path_or_url, &request, None)
                .await;
        };

        let attempts = max_attempts.clamp(1, pool_size);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let (index, endpoint) = {
                let mut pool = lock(pool);
                let index = match pool.next_candidate() {
                    Some(index) => index,
                    None => {
                        warn!("all endpoints marked failed, clearing failure marks");
                        pool.clear_failed();
                        pool.next_candidate()
                            .ok_or_else(|| ApiError::configuration("endpoint pool is empty"))?
                    }
                };
                let endpoint = pool
                    .endpoint(index)
                    .cloned()
                    .ok_or_else(|| ApiError::configuration("endpoint pool is empty"))?;
                (index, endpoint)
            };

            let url = endpoint.join(&suffix);
            let attempt_number = u32::try_from(attempt).unwrap_or(u32::MAX);
            let error = match self
                .sender
                .send(request_id, attempt_number, &url, &request, Some(endpoint.name()))
                .await
            {
                Ok(response) => {
                    let mut pool = lock(pool);
                    if still_holds(&pool, index, &endpoint) {
                        pool.mark_succeeded(index);
                    }
                    debug!(endpoint = endpoint.name(), attempt, "request succeeded");
                    return Ok(response);
                }
                Err(error) => error,
            };

            if !self
                .classifier
                .classify(&error, DispatchContext::MultiEndpoint)
                .is_retryable()
            {
                error!(
                    endpoint = endpoint.name(),
                    attempt,
                    error = %error,
                    "request failed with non-retryable error"
                );
                return Err(error);
            }

            {
                let mut pool = lock(pool);
                if still_holds(&pool, index, &endpoint) {
                    pool.mark_failed(index);
                }
            }
            warn!(
                endpoint = endpoint.name(),
                url,
                attempt,
                max_attempts = attempts,
                error = %error,
                "endpoint failed, rotating"
            );
            last_error = Some(error);
        }

        let error = last_error
            .unwrap_or_else(|| ApiError::configuration("no endpoint was attempted"));
        error!(attempts, error = %error, "all endpoint attempts failed");
        Err(error)
    }
}
