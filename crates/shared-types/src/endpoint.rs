// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint values
//!
//! An [`Endpoint`] is one independently operated base URL serving a logical service.
//! Endpoints are valid by construction: the base URL always parses as an absolute
//! `http`/`https` URL and is stored without a trailing slash, so suffixes can be
//! appended and stripped without ambiguity.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// One independently operated base URL for a logical service
///
/// Identity is the base URL: two endpoints with the same base URL compare equal
/// regardless of their display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoint", into = "RawEndpoint")]
pub struct Endpoint {
    name: String,
    base_url: String,
}

/// Errors raised when constructing an [`Endpoint`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum EndpointError {
    /// Endpoint name was empty or whitespace-only
    #[error("endpoint name cannot be empty")]
    EmptyName,

    /// Base URL did not parse
    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Base URL used a scheme other than http or https
    #[error("unsupported scheme '{scheme}' in base URL '{url}'")]
    UnsupportedScheme { url: String, scheme: String },
}

impl Endpoint {
    /// Create a new endpoint, validating and normalizing the base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, or the base URL is not an absolute
    /// `http`/`https` URL
    pub fn new(name: impl Into<String>, base_url: impl AsRef<str>) -> Result<Self, EndpointError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EndpointError::EmptyName);
        }

        let raw = base_url.as_ref().trim();
        let parsed = Url::parse(raw).map_err(|e| EndpointError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        Ok(Self {
            name,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Display name of the operator publishing this endpoint
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a base-relative suffix onto this endpoint's base URL
    pub fn join(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.base_url.clone()
        } else if suffix.starts_with('/') || suffix.starts_with('?') {
            format!("{}{suffix}", self.base_url)
        } else {
            format!("{}/{suffix}", self.base_url)
        }
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base_url.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

#[derive(Serialize, Deserialize)]
struct RawEndpoint {
    name: String,
    base_url: String,
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = EndpointError;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.base_url)
    }
}

impl From<Endpoint> for RawEndpoint {
    fn from(endpoint: Endpoint) -> Self {
        Self {
            name: endpoint.name,
            base_url: endpoint.base_url,
        }
    }
}
