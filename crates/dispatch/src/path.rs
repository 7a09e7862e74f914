// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! URL and path handling
//!
//! Generated per-operation clients may hand the dispatcher a URL already bound to one
//! endpoint. [`PathRewriter`] recovers the base-relative suffix so the request can be
//! re-targeted at any endpoint in the pool.

use api_client::{ApiError, ApiResult, is_absolute_url};
use url::Url;

/// Path segment at which the scan API is mounted on every operator's host
pub const DEFAULT_MOUNT_POINT: &str = "/api/scan";

/// Reduces full URLs to base-relative suffixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewriter {
    mount_point: String,
}

impl Default for PathRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_POINT)
    }
}

fn at_boundary(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')
}

impl PathRewriter {
    /// Create a rewriter for the given mount point, e.g. `/api/scan`
    pub fn new(mount_point: impl Into<String>) -> Self {
        let mount_point = mount_point.into();
        Self {
            mount_point: mount_point.trim_end_matches('/').to_string(),
        }
    }

    /// The mount point this rewriter strips through
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Reduce `path_or_url` to a suffix relative to any pool base URL
    ///
    /// Strips a matching known base first, then everything through the mount point.
    /// Paths that are already relative are returned unchanged. Returns `None` for an
    /// absolute URL matching neither, which must be sent as-is.
    pub fn to_relative(&self, path_or_url: &str, known_bases: &[String]) -> Option<String> {
        for base in known_bases {
            let base = base.trim_end_matches('/');
            if let Some(rest) = path_or_url.strip_prefix(base)
                && at_boundary(rest)
            {
                return Some(rest.to_string());
            }
        }

        if !self.mount_point.is_empty() {
            let path_end = path_or_url.find(['?', '#']).unwrap_or(path_or_url.len());
            let path = &path_or_url[..path_end];
            let mut search_from = 0;
            while let Some(offset) = path[search_from..].find(&self.mount_point) {
                let end = search_from + offset + self.mount_point.len();
                let rest = &path_or_url[end..];
                if at_boundary(rest) {
                    return Some(rest.to_string());
                }
                search_from = end;
            }
        }

        if is_absolute_url(path_or_url) {
            None
        } else {
            Some(path_or_url.to_string())
        }
    }
}

/// Join a base URL and a base-relative path, or pass an absolute URL through
///
/// # Errors
///
/// Returns [`ApiError::Validation`] if the result is not a valid URL
pub fn join_url(base_url: &str, path_or_url: &str) -> ApiResult<String> {
    let joined = if is_absolute_url(path_or_url) {
        path_or_url.to_string()
    } else {
        let base = base_url.trim_end_matches('/');
        match path_or_url.chars().next() {
            None => base.to_string(),
            Some('/' | '?') => format!("{base}{path_or_url}"),
            Some(_) => format!("{base}/{path_or_url}"),
        }
    };

    Url::parse(&joined)
        .map_err(|e| ApiError::validation(format!("invalid URL '{joined}': {e}")))?;
    Ok(joined)
}
