// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Dispatch configuration
//!
//! Values are layered with the `config` crate, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional `dispatch.{yaml,toml,json}` file
//! 3. Environment variables prefixed with `DISPATCH_`, e.g. `DISPATCH_MAX_RETRIES=5`

use std::{fmt, path::PathBuf, time::Duration};

use api_client::{ApiError, ApiResult, IdempotencyKey, RetryBudget};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use shared_types::Network;

use crate::transport::DEFAULT_USER_AGENT;

// Validation bounds
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_ENDPOINT_ATTEMPTS: usize = 64;

/// Tunables for both dispatch engines and the clients built on them
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Network whose endpoint table the scan client uses
    pub network: Network,
    /// Preferred operator, moved to the front of the pool
    pub provider_hint: Option<String>,
    /// Retries after the first attempt on a single endpoint
    pub max_retries: u32,
    /// Delay between single-endpoint attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum endpoints tried per logical request
    pub max_endpoint_attempts: usize,
    /// Seconds after which endpoint failure marks are cleared
    pub reset_window_secs: u64,
    /// Per-attempt transport timeout, in seconds
    pub request_timeout_secs: u64,
    /// Body field rewritten before a retry
    pub idempotency_field: String,
    /// Suffix appended to the idempotency field on each retry
    pub idempotency_suffix: String,
    /// YAML endpoint catalog replacing the built-in tables
    pub catalog_file: Option<PathBuf>,
    /// Base URL of the authenticated ledger API
    pub ledger_base_url: Option<String>,
    /// Pre-issued bearer token for the ledger API
    pub bearer_token: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let budget = RetryBudget::default();
        let idempotency = IdempotencyKey::default();
        Self {
            network: Network::default(),
            provider_hint: None,
            max_retries: budget.max_retries,
            retry_delay_ms: budget.delay_ms,
            max_endpoint_attempts: 5,
            reset_window_secs: 300,
            request_timeout_secs: 30,
            idempotency_field: idempotency.field,
            idempotency_suffix: idempotency.suffix,
            catalog_file: None,
            ledger_base_url: None,
            bearer_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("network", &self.network)
            .field("provider_hint", &self.provider_hint)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_endpoint_attempts", &self.max_endpoint_attempts)
            .field("reset_window_secs", &self.reset_window_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("idempotency_field", &self.idempotency_field)
            .field("idempotency_suffix", &self.idempotency_suffix)
            .field("catalog_file", &self.catalog_file)
            .field("ledger_base_url", &self.ledger_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DispatchConfig {
    /// Load and validate configuration from the default file and the environment
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if configuration cannot be loaded or is invalid
    pub fn from_env() -> ApiResult<Self> {
        let config = Self::load()
            .map_err(|e| ApiError::configuration(format!("failed to load configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `dispatch.*` and `DISPATCH_` variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value has the wrong type
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("dispatch")
    }

    /// Load configuration from the named file (extension optional) and the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value has the wrong type
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("network", defaults.network.as_str())?
            .set_default("max_retries", u64::from(defaults.max_retries))?
            .set_default("retry_delay_ms", defaults.retry_delay_ms)?
            .set_default(
                "max_endpoint_attempts",
                u64::try_from(defaults.max_endpoint_attempts).unwrap_or(u64::MAX),
            )?
            .set_default("reset_window_secs", defaults.reset_window_secs)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("idempotency_field", defaults.idempotency_field)?
            .set_default("idempotency_suffix", defaults.idempotency_suffix)?
            .set_default("user_agent", defaults.user_agent)?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("DISPATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] naming the first invalid value
    pub fn validate(&self) -> ApiResult<()> {
        if self.max_endpoint_attempts == 0 || self.max_endpoint_attempts > MAX_ENDPOINT_ATTEMPTS {
            return Err(ApiError::configuration(format!(
                "max_endpoint_attempts must be between 1 and {MAX_ENDPOINT_ATTEMPTS}, got {}",
                self.max_endpoint_attempts
            )));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ApiError::configuration(format!(
                "request_timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {}",
                self.request_timeout_secs
            )));
        }

        if self.reset_window_secs == 0 {
            return Err(ApiError::configuration("reset_window_secs cannot be 0"));
        }

        if self.idempotency_field.trim().is_empty() {
            return Err(ApiError::configuration("idempotency_field cannot be empty"));
        }

        if self.idempotency_suffix.is_empty() {
            return Err(ApiError::configuration("idempotency_suffix cannot be empty"));
        }

        if let Some(base_url) = &self.ledger_base_url {
            url::Url::parse(base_url).map_err(|e| {
                ApiError::configuration(format!("invalid ledger_base_url '{base_url}': {e}"))
            })?;
        }

        if self.bearer_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ApiError::configuration("bearer_token cannot be blank"));
        }

        Ok(())
    }

    /// Single-endpoint retry budget
    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget {
            max_retries: self.max_retries,
            delay_ms: self.retry_delay_ms,
        }
    }

    /// Idempotency rewrite rule
    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::new(&self.idempotency_field, &self.idempotency_suffix)
    }

    /// Endpoint failure reset window
    pub fn reset_window(&self) -> Duration {
        Duration::from_secs(self.reset_window_secs)
    }

    /// Per-attempt transport timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
