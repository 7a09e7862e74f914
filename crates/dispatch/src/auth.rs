// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bearer token providers

use std::fmt;

use api_client::{ApiError, ApiResult, Authenticator};

/// A fixed, pre-issued bearer token
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Authenticator for StaticToken {
    async fn bearer_token(&self) -> ApiResult<String> {
        if self.token.trim().is_empty() {
            return Err(ApiError::configuration("bearer token cannot be empty"));
        }
        Ok(self.token.clone())
    }
}

/// No credentials; used for publicly readable services
#[derive(Debug, Clone, Copy, Default)]
pub struct Unauthenticated;

impl Authenticator for Unauthenticated {
    async fn bearer_token(&self) -> ApiResult<String> {
        Err(ApiError::configuration(
            "no credentials configured for this client",
        ))
    }

    fn requires_auth(&self) -> bool {
        false
    }
}
