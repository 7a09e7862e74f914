// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Retry budget policy values

use std::time::Duration;

use serde::{Deserialize, Serialize};

// Retry budget defaults
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 6000;

/// Immutable retry policy for one executor
///
/// A budget of `max_retries = n` allows `n + 1` transport attempts in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudget {
    /// Number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay between attempts, in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryBudget {
    /// Create a budget from a retry count and delay
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// A budget allowing exactly one attempt
    ///
    /// Used for the per-endpoint transport call when rotation replaces per-host retry.
    pub const fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            delay_ms: 0,
        }
    }

    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Total number of transport attempts this budget allows
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Apply a partial update, returning the new budget
    #[must_use]
    pub fn with_update(self, update: &RetryConfigUpdate) -> Self {
        Self {
            max_retries: update.max_retries.unwrap_or(self.max_retries),
            delay_ms: update.delay_ms.unwrap_or(self.delay_ms),
        }
    }
}

/// Partial retry budget used to tighten or loosen a client's defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfigUpdate {
    /// New retry count, if changing
    pub max_retries: Option<u32>,
    /// New delay in milliseconds, if changing
    pub delay_ms: Option<u64>,
}

impl RetryConfigUpdate {
    /// Set the retry count
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay between attempts
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
