// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint pool with failure tracking and sticky success
//!
//! The pool is the mutable heart of multi-endpoint dispatch. It remembers which
//! endpoints failed recently, sticks to whichever one last succeeded, and forgets all
//! failures once the reset window has elapsed so that recovered endpoints are
//! eventually retried.
//!
//! All methods are synchronous. Callers share a pool behind a mutex and must never hold
//! the guard across an await point.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::Serialize;
use shared_types::Endpoint;
use tokio::time::Instant;
use url::Url;

/// Default interval after which failure marks are forgotten
pub const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Lock a shared pool, recovering the state if a previous holder panicked
pub(crate) fn lock(pool: &Mutex<EndpointPool>) -> MutexGuard<'_, EndpointPool> {
    pool.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered endpoints plus per-endpoint health state
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    current: usize,
    failed: BTreeSet<usize>,
    last_reset_at: Instant,
    reset_window: Duration,
}

/// Point-in-time view of a pool, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Endpoints in preference order
    pub endpoints: Vec<Endpoint>,
    /// Index of the sticky endpoint
    pub current: usize,
    /// Indices currently marked failed
    pub failed: Vec<usize>,
    /// Time left until failure marks are cleared
    pub reset_in: Duration,
}

fn dedup_by_base_url(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut unique: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        if !unique.contains(&endpoint) {
            unique.push(endpoint);
        }
    }
    unique
}

fn matches_hint(endpoint: &Endpoint, hint: &str) -> bool {
    endpoint.name().eq_ignore_ascii_case(hint)
        || Url::parse(endpoint.base_url())
            .ok()
            .and_then(|url| url.host_str().map(|host| host.eq_ignore_ascii_case(hint)))
            .unwrap_or(false)
}

impl EndpointPool {
    /// Create a pool in catalog order
    ///
    /// Endpoints sharing a base URL are collapsed into the first occurrence.
    pub fn new(endpoints: Vec<Endpoint>, reset_window: Duration) -> Self {
        Self {
            endpoints: dedup_by_base_url(endpoints),
            current: 0,
            failed: BTreeSet::new(),
            last_reset_at: Instant::now(),
            reset_window,
        }
    }

    /// Create a pool with the endpoint matching `provider_hint` moved to the front
    ///
    /// An endpoint matches when its name or its base URL's host equals the hint,
    /// ignoring case. Only the first match moves; catalog order is otherwise preserved.
    pub fn with_affinity(
        endpoints: Vec<Endpoint>,
        provider_hint: Option<&str>,
        reset_window: Duration,
    ) -> Self {
        Self::new(Self::order_by_affinity(endpoints, provider_hint), reset_window)
    }

    fn order_by_affinity(
        mut endpoints: Vec<Endpoint>,
        provider_hint: Option<&str>,
    ) -> Vec<Endpoint> {
        let hint = provider_hint.map(str::trim).unwrap_or_default();
        if hint.is_empty() {
            return endpoints;
        }
        if let Some(position) = endpoints.iter().position(|e| matches_hint(e, hint)) {
            let preferred = endpoints.remove(position);
            endpoints.insert(0, preferred);
        }
        endpoints
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the pool has no endpoints
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in preference order
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Endpoint at `index`
    pub fn endpoint(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }

    /// Base URLs in preference order
    pub fn base_urls(&self) -> Vec<String> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.base_url().to_string())
            .collect()
    }

    /// Index of the sticky endpoint
    pub fn current(&self) -> usize {
        self.current
    }

    /// Whether `index` is marked failed
    pub fn is_failed(&self, index: usize) -> bool {
        self.failed.contains(&index)
    }

    /// Number of endpoints marked failed
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Window after which failure marks are cleared
    pub fn reset_window(&self) -> Duration {
        self.reset_window
    }

    /// First non-failed endpoint, scanning from the sticky index and wrapping around
    pub fn next_candidate(&self) -> Option<usize> {
        let len = self.endpoints.len();
        (0..len)
            .map(|offset| (self.current + offset) % len)
            .find(|index| !self.failed.contains(index))
    }

    /// Mark an endpoint failed; out-of-range indices are ignored
    pub fn mark_failed(&mut self, index: usize) {
        if index < self.endpoints.len() {
            self.failed.insert(index);
        }
    }

    /// Make an endpoint sticky; out-of-range indices are ignored
    ///
    /// Failure marks are left alone. An endpoint that failed earlier stays excluded until
    /// the reset window elapses or a full sweep clears the marks.
    pub fn mark_succeeded(&mut self, index: usize) {
        if index < self.endpoints.len() {
            self.current = index;
        }
    }

    /// Forget all failure marks
    pub fn clear_failed(&mut self) {
        self.failed.clear();
    }

    /// Clear failure marks if the reset window has elapsed since the last reset
    ///
    /// The sticky index is kept. Returns whether a reset happened.
    pub fn maybe_reset(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_reset_at) <= self.reset_window {
            return false;
        }
        self.failed.clear();
        self.last_reset_at = now;
        true
    }

    /// Swap in a new endpoint list, resetting all health state
    pub fn replace_endpoints(
        &mut self,
        endpoints: Vec<Endpoint>,
        provider_hint: Option<&str>,
        now: Instant,
    ) {
        self.endpoints = dedup_by_base_url(Self::order_by_affinity(endpoints, provider_hint));
        self.current = 0;
        self.failed.clear();
        self.last_reset_at = now;
    }

    /// Diagnostic view of the pool at `now`
    pub fn snapshot(&self, now: Instant) -> PoolSnapshot {
        let elapsed = now.saturating_duration_since(self.last_reset_at);
        PoolSnapshot {
            endpoints: self.endpoints.clone(),
            current: self.current,
            failed: self.failed.iter().copied().collect(),
            reset_in: self.reset_window.saturating_sub(elapsed),
        }
    }
}
