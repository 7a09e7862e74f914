// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client facades
//!
//! [`LedgerApiClient`] talks to one authenticated participant node and retries on that
//! host. [`ScanClient`] talks to a service published by many operators and rotates
//! across them. Both expose the same `perform_request` surface so generated
//! per-operation clients can sit on either.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use api_client::{
    ApiError, ApiResult, Authenticator, EndpointCatalog, HttpMethod, LogicalRequest,
    RequestLogger, RetryBudget, RetryConfigUpdate, Transport, TransportResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{Endpoint, Network};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    attempt::AttemptSender,
    auth::{StaticToken, Unauthenticated},
    catalog::StaticCatalog,
    config::DispatchConfig,
    dispatcher::MultiEndpointDispatcher,
    executor::SingleEndpointExecutor,
    logging::TracingRequestLogger,
    path::{PathRewriter, join_url},
    pool::{EndpointPool, PoolSnapshot, lock},
    transport::HttpTransport,
};

/// Per-call overrides of a client's defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Retries on a single endpoint
    pub max_retries: Option<u32>,
    /// Delay between single-endpoint attempts
    pub delay: Option<Duration>,
    /// Endpoints tried when rotating
    pub max_endpoint_attempts: Option<usize>,
    /// Extra headers for this call
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Override the retry count
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Override the delay between attempts
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Override the number of endpoints tried
    #[must_use]
    pub fn max_endpoint_attempts(mut self, attempts: usize) -> Self {
        self.max_endpoint_attempts = Some(attempts);
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn budget_update(&self) -> RetryConfigUpdate {
        let update = RetryConfigUpdate {
            max_retries: self.max_retries,
            ..RetryConfigUpdate::default()
        };
        match self.delay {
            Some(delay) => update.delay(delay),
            None => update,
        }
    }
}

fn build_request(
    method: HttpMethod,
    path_or_url: &str,
    body: Option<Value>,
    options: &RequestOptions,
) -> LogicalRequest {
    let mut request = LogicalRequest::new(method, path_or_url);
    request.body = body;
    request.headers.extend(options.headers.clone());
    request
}

fn decode<R: DeserializeOwned>(response: TransportResponse) -> ApiResult<R> {
    serde_json::from_value(response.body)
        .map_err(|e| ApiError::invalid_response(format!("failed to decode response: {e}")))
}

fn shared_sender<T: Transport, A: Authenticator>(
    transport: T,
    authenticator: A,
    logger: Arc<dyn RequestLogger>,
) -> Arc<AttemptSender<T, A>> {
    Arc::new(AttemptSender::new(transport, authenticator, logger))
}

/// Client for one authenticated ledger API host
#[derive(Debug)]
pub struct LedgerApiClient<T = HttpTransport, A = StaticToken> {
    base_url: String,
    executor: SingleEndpointExecutor<T, A>,
    budget: RetryBudget,
}

impl LedgerApiClient {
    /// Build a client from configuration using the reqwest transport and a static token
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the base URL or token is missing or invalid
    pub fn from_config(config: &DispatchConfig) -> ApiResult<Self> {
        config.validate()?;
        let base_url = config
            .ledger_base_url
            .as_deref()
            .ok_or_else(|| ApiError::configuration("ledger_base_url is required"))?;
        let token = config
            .bearer_token
            .as_deref()
            .ok_or_else(|| ApiError::configuration("bearer_token is required"))?;
        let transport = HttpTransport::new(config.request_timeout(), &config.user_agent)?;

        Self::new(
            base_url,
            config,
            transport,
            StaticToken::new(token),
            Arc::new(TracingRequestLogger),
        )
    }
}

impl<T: Transport, A: Authenticator> LedgerApiClient<T, A> {
    /// Create a client for `base_url` from its collaborators
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if `base_url` is not a valid URL
    pub fn new(
        base_url: impl Into<String>,
        config: &DispatchConfig,
        transport: T,
        authenticator: A,
        logger: Arc<dyn RequestLogger>,
    ) -> ApiResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        join_url(&base_url, "")
            .map_err(|e| ApiError::configuration(format!("invalid ledger base URL: {e}")))?;

        let sender = shared_sender(transport, authenticator, logger);
        Ok(Self {
            base_url,
            executor: SingleEndpointExecutor::new(sender, config.idempotency_key()),
            budget: config.retry_budget(),
        })
    }

    /// Base URL every request is sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current default retry budget
    pub fn retry_budget(&self) -> RetryBudget {
        self.budget
    }

    /// Merge a partial update into the default retry budget
    pub fn set_retry_config(&mut self, update: &RetryConfigUpdate) {
        self.budget = self.budget.with_update(update);
        debug!(
            max_retries = self.budget.max_retries,
            delay_ms = self.budget.delay_ms,
            "retry configuration updated"
        );
    }

    /// Send a request, retrying on this host, and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns the terminal [`ApiError`] once retries are exhausted or a fatal error
    /// occurs, or [`ApiError::InvalidResponse`] if the body does not decode into `R`
    pub async fn perform_request<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path_or_url: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> ApiResult<R> {
        let request = build_request(method, path_or_url, body, options);
        let budget = self.budget.with_update(&options.budget_update());
        let response = self.executor.execute(request, &self.base_url, budget).await?;
        decode(response)
    }
}

/// Client for the scan API, published redundantly by many operators
#[derive(Debug)]
pub struct ScanClient<T = HttpTransport, A = Unauthenticated> {
    network: Network,
    provider_hint: Option<String>,
    pool: Mutex<EndpointPool>,
    rewriter: PathRewriter,
    executor: SingleEndpointExecutor<T, A>,
    dispatcher: MultiEndpointDispatcher<T, A>,
    budget: RetryBudget,
    max_endpoint_attempts: usize,
}

impl ScanClient {
    /// Build an unauthenticated client from configuration
    ///
    /// Uses the catalog file when one is configured, the built-in tables otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if configuration is invalid or the catalog
    /// cannot be loaded
    pub async fn from_config(config: &DispatchConfig) -> ApiResult<Self> {
        config.validate()?;
        let catalog = match &config.catalog_file {
            Some(path) => StaticCatalog::from_file(path).await?,
            None => StaticCatalog::builtin(),
        };
        let transport = HttpTransport::new(config.request_timeout(), &config.user_agent)?;

        Ok(Self::new(
            config,
            &catalog,
            transport,
            Unauthenticated,
            Arc::new(TracingRequestLogger),
        ))
    }
}

impl<T: Transport, A: Authenticator> ScanClient<T, A> {
    /// Create a client for the configured network from its collaborators
    pub fn new<C: EndpointCatalog>(
        config: &DispatchConfig,
        catalog: &C,
        transport: T,
        authenticator: A,
        logger: Arc<dyn RequestLogger>,
    ) -> Self {
        let provider_hint = config.provider_hint.clone();
        let endpoints = catalog.list(config.network, provider_hint.as_deref());
        let pool =
            EndpointPool::with_affinity(endpoints, provider_hint.as_deref(), config.reset_window());

        info!(
            network = %config.network,
            endpoints = pool.len(),
            preferred = pool.endpoint(0).map_or("-", Endpoint::name),
            "scan client initialized"
        );

        let rewriter = PathRewriter::default();
        let sender = shared_sender(transport, authenticator, logger);
        Self {
            network: config.network,
            provider_hint,
            pool: Mutex::new(pool),
            executor: SingleEndpointExecutor::new(sender.clone(), config.idempotency_key()),
            dispatcher: MultiEndpointDispatcher::new(sender, rewriter.clone()),
            rewriter,
            budget: config.retry_budget(),
            max_endpoint_attempts: config.max_endpoint_attempts,
        }
    }

    /// Network this client targets
    pub fn network(&self) -> Network {
        self.network
    }

    /// Current default retry budget, used when the pool holds a single endpoint
    pub fn retry_budget(&self) -> RetryBudget {
        self.budget
    }

    /// Merge a partial update into the default retry budget
    pub fn set_retry_config(&mut self, update: &RetryConfigUpdate) {
        self.budget = self.budget.with_update(update);
    }

    /// Change how many endpoints are tried per request
    pub fn set_max_endpoint_attempts(&mut self, attempts: usize) {
        self.max_endpoint_attempts = attempts.max(1);
    }

    /// Reload the endpoint table from `catalog`, discarding health state
    pub fn refresh_endpoints<C: EndpointCatalog>(&self, catalog: &C) {
        let endpoints = catalog.list(self.network, self.provider_hint.as_deref());
        let mut pool = lock(&self.pool);
        pool.replace_endpoints(endpoints, self.provider_hint.as_deref(), Instant::now());
        info!(
            network = %self.network,
            endpoints = pool.len(),
            "endpoint pool refreshed"
        );
    }

    /// Diagnostic view of the endpoint pool
    pub fn snapshot(&self) -> PoolSnapshot {
        lock(&self.pool).snapshot(Instant::now())
    }

    /// Send a request across the endpoint pool and decode the JSON response
    ///
    /// A pool with exactly one endpoint falls back to single-endpoint retry, since
    /// there is nothing to rotate to.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`ApiError`], or [`ApiError::InvalidResponse`] if the body
    /// does not decode into `R`
    pub async fn perform_request<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path_or_url: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> ApiResult<R> {
        let mut request = build_request(method, path_or_url, body, options);

        let single_base = {
            let pool = lock(&self.pool);
            (pool.len() == 1).then(|| pool.base_urls())
        };

        let response = match single_base {
            Some(bases) => {
                if let Some(suffix) = self.rewriter.to_relative(&request.path_or_url, &bases) {
                    request.path_or_url = suffix;
                }
                let budget = self.budget.with_update(&options.budget_update());
                self.executor.execute(request, &bases[0], budget).await?
            }
            None => {
                let attempts = options
                    .max_endpoint_attempts
                    .unwrap_or(self.max_endpoint_attempts);
                self.dispatcher.dispatch(request, &self.pool, attempts).await?
            }
        };

        decode(response)
    }

    /// Send a request through the pool, returning the raw response
    ///
    /// # Errors
    ///
    /// Returns the terminal [`ApiError`]
    pub async fn perform_raw(
        &self,
        method: HttpMethod,
        path_or_url: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> ApiResult<Value> {
        self.perform_request(method, path_or_url, body, options).await
    }
}
