// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient request dispatch for ledger network APIs
//!
//! Two engines sit between generated per-operation API clients and the network:
//!
//! - [`SingleEndpointExecutor`] retries one authenticated host within a
//!   [`RetryBudget`](api_client::RetryBudget), rewriting the idempotency key before every
//!   retry so resubmissions are not rejected as duplicates
//! - [`MultiEndpointDispatcher`] rotates across an [`EndpointPool`] of operators that
//!   publish the same API, marking failures, sticking to the last good endpoint, and
//!   forgetting failures after a reset window
//!
//! [`LedgerApiClient`] and [`ScanClient`] wrap the engines behind a single
//! `perform_request` call, and [`DispatchConfig`] loads their tunables.

pub mod attempt;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod logging;
pub mod path;
pub mod pool;
pub mod transport;

#[cfg(test)]
mod testing;

pub use attempt::AttemptSender;
pub use auth::{StaticToken, Unauthenticated};
pub use catalog::StaticCatalog;
pub use client::{LedgerApiClient, RequestOptions, ScanClient};
pub use config::DispatchConfig;
pub use dispatcher::MultiEndpointDispatcher;
pub use executor::SingleEndpointExecutor;
pub use logging::TracingRequestLogger;
pub use path::PathRewriter;
pub use pool::{EndpointPool, PoolSnapshot};
pub use transport::HttpTransport;
