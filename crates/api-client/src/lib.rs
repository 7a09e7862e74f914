// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request model, error taxonomy and retry classification for ledger API clients
//!
//! This crate provides the transport-independent core shared by every API client that
//! talks to the ledger network, whether it targets one authenticated participant node or a
//! service published redundantly by many independent operators.
//!
//! # Core Abstractions
//!
//! - **Error Taxonomy**: [`ApiError`] is a closed set of failure shapes produced at the
//!   transport boundary
//! - **Classification**: [`ErrorClassifier`] decides whether a failure is worth another
//!   attempt, and is the only place that decision is made
//! - **Retry Policy**: [`RetryBudget`] and [`RetryConfigUpdate`]
//! - **Requests**: [`LogicalRequest`] plus the [`IdempotencyKey`] rewrite applied on retry
//! - **Collaborators**: [`Transport`], [`Authenticator`], [`EndpointCatalog`] and
//!   [`RequestLogger`] are the narrow seams to the outside world

use serde_json::Value;
use shared_types::{Endpoint, Network};

pub mod classify;
pub mod error;
pub mod record;
pub mod request;
pub mod retry;

pub use classify::{Classification, DispatchContext, ErrorClassifier};
pub use error::{ApiError, ApiResult};
pub use record::{AttemptOutcome, AttemptRecord};
pub use request::{HttpMethod, IdempotencyKey, LogicalRequest, is_absolute_url};
pub use retry::{RetryBudget, RetryConfigUpdate};

/// A decoded success response
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status (always a success status)
    pub status: u16,
    /// JSON body, `Null` when the response was empty
    pub body: Value,
}

/// One transport attempt against a fully resolved URL
///
/// Implementations must turn every failure into an [`ApiError`]: no response becomes
/// [`ApiError::Transport`], an error status becomes [`ApiError::Service`] carrying the
/// machine-readable code from the body when one is present.
pub trait Transport: Send + Sync {
    /// Send `request` to `url` once
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received or the response had an error status
    fn send(
        &self,
        url: &str,
        request: &LogicalRequest,
    ) -> impl Future<Output = ApiResult<TransportResponse>> + Send;
}

/// Source of bearer tokens injected before each transport attempt
pub trait Authenticator: Send + Sync {
    /// Current bearer token, acquiring or refreshing it as needed
    ///
    /// # Errors
    ///
    /// Returns an error if no token could be obtained
    fn bearer_token(&self) -> impl Future<Output = ApiResult<String>> + Send;

    /// Whether requests through this authenticator carry an `Authorization` header
    fn requires_auth(&self) -> bool {
        true
    }
}

/// Static tables of redundantly published endpoints per network
pub trait EndpointCatalog: Send + Sync {
    /// Endpoints for `network` in catalog order
    ///
    /// The provider hint is informational; ordering by affinity is applied by the pool.
    fn list(&self, network: Network, provider_hint: Option<&str>) -> Vec<Endpoint>;
}

/// Receives one record after every transport attempt
pub trait RequestLogger: Send + Sync {
    /// Record an attempt
    fn record(&self, record: &AttemptRecord);
}
