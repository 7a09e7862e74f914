// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry against one fixed base URL

use std::sync::Arc;

use api_client::{
    ApiResult, Authenticator, DispatchContext, ErrorClassifier, IdempotencyKey, LogicalRequest,
    RetryBudget, Transport, TransportResponse,
};
use tokio_retry::strategy::FixedInterval;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{attempt::AttemptSender, path::join_url};

/// Retries one logical request against a single endpoint
#[derive(Debug)]
pub struct SingleEndpointExecutor<T, A> {
    sender: Arc<AttemptSender<T, A>>,
    classifier: ErrorClassifier,
    idempotency: IdempotencyKey,
}

impl<T: Transport, A: Authenticator> SingleEndpointExecutor<T, A> {
    /// Create an executor sending through `sender`
    pub fn new(sender: Arc<AttemptSender<T, A>>, idempotency: IdempotencyKey) -> Self {
        Self {
            sender,
            classifier: ErrorClassifier::new(),
            idempotency,
        }
    }

    /// Send `request` to `base_url`, retrying retryable failures within `budget`
    ///
    /// At most `budget.max_retries + 1` attempts are made, separated by `budget.delay()`.
    /// Before each retry of a POST or PATCH the idempotency key in the body is suffixed,
    /// so every attempt carries a distinct key.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, or the last retryable error once the budget is spent
    #[instrument(
        skip_all,
        fields(
            request_id = tracing::field::Empty,
            method = %request.method,
            path = %request.path_or_url,
        )
    )]
    pub async fn execute(
        &self,
        mut request: LogicalRequest,
        base_url: &str,
        budget: RetryBudget,
    ) -> ApiResult<TransportResponse> {
        request.validate()?;
        let url = join_url(base_url, &request.path_or_url)?;

        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let mut delays = FixedInterval::new(budget.delay()).take(budget.max_retries as usize);
        let mut attempt: u32 = 1;

        loop {
            let error = match self
                .sender
                .send(request_id, attempt, &url, &request, None)
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let classification = self
                .classifier
                .classify(&error, DispatchContext::SingleEndpoint);
            if !classification.is_retryable() {
                error!(attempt, url, error = %error, "request failed with non-retryable error");
                return Err(error);
            }

            let Some(delay) = delays.next() else {
                error!(
                    attempts = attempt,
                    url,
                    error = %error,
                    "request failed, retry budget exhausted"
                );
                return Err(error);
            };

            warn!(
                attempt,
                max_retries = budget.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                url,
                error = %error,
                "retryable failure, retrying"
            );
            tokio::time::sleep(delay).await;

            self.idempotency.prepare_retry(&mut request);
            attempt = attempt.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use api_client::{ApiError, classify::SEQUENCER_BACKPRESSURE};
    use serde_json::json;

    use super::*;
    use crate::{
        auth::Unauthenticated,
        testing::{ScriptedTransport, counting_logger, quiet_logger},
    };

    const BASE: &str = "https://ledger.example.com";

    fn executor(
        transport: &ScriptedTransport,
    ) -> SingleEndpointExecutor<ScriptedTransport, Unauthenticated> {
        let sender = AttemptSender::new(transport.clone(), Unauthenticated, quiet_logger());
        SingleEndpointExecutor::new(Arc::new(sender), IdempotencyKey::default())
    }

    fn budget(max_retries: u32) -> RetryBudget {
        RetryBudget::new(max_retries, Duration::from_millis(6000))
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_failures_exhaust_the_budget() {
        let transport =
            ScriptedTransport::new((0..10).map(|_| Err(ApiError::service(503, None, "down"))));
        let started = tokio::time::Instant::now();

        let error = executor(&transport)
            .execute(LogicalRequest::get("/v2/state"), BASE, budget(3))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(503));
        assert_eq!(transport.urls().len(), 4);
        assert!(started.elapsed() >= Duration::from_millis(18_000));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_failure_is_not_retried() {
        let transport = ScriptedTransport::new([Err(ApiError::service(404, None, "missing"))]);

        let error = executor(&transport)
            .execute(LogicalRequest::get("/v2/users/bob"), BASE, budget(3))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(404));
        assert_eq!(transport.urls(), vec![format!("{BASE}/v2/users/bob")]);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_fatal_on_a_single_endpoint() {
        let transport = ScriptedTransport::new([Err(ApiError::service(429, None, "slow down"))]);

        let error = executor(&transport)
            .execute(LogicalRequest::get("/v2/state"), BASE, budget(3))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(429));
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rewrite_command_id_every_time() {
        let transport = ScriptedTransport::new([
            Err(ApiError::service(409, Some(SEQUENCER_BACKPRESSURE), "busy")),
            Err(ApiError::transport("reset by peer")),
            Ok(json!({"updateId": "u1"})),
        ]);

        let response = executor(&transport)
            .execute(
                LogicalRequest::post("/v2/commands/submit-and-wait", json!({"commandId": "abc"})),
                BASE,
                budget(3),
            )
            .await
            .unwrap();

        assert_eq!(response.body, json!({"updateId": "u1"}));
        let ids: Vec<_> = transport
            .requests()
            .into_iter()
            .map(|(_, request)| request.body.unwrap()["commandId"].clone())
            .collect();
        assert_eq!(ids, vec![json!("abc"), json!("abc-retry"), json!("abc-retry-retry")]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_one_attempt() {
        let transport = ScriptedTransport::new([Err(ApiError::service(500, None, "boom"))]);
        let sender = AttemptSender::new(transport.clone(), Unauthenticated, counting_logger(1));
        let executor = SingleEndpointExecutor::new(Arc::new(sender), IdempotencyKey::default());

        assert!(
            executor
                .execute(LogicalRequest::get("/v2/state"), BASE, RetryBudget::single_attempt())
                .await
                .is_err()
        );
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_transport() {
        let transport = ScriptedTransport::default();

        let error = executor(&transport)
            .execute(LogicalRequest::get(""), BASE, budget(3))
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::Validation { .. }));
        assert!(transport.urls().is_empty());
    }
}
