// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint catalogs
//!
//! A catalog is a static table of the hosts that publish the scan API on each network.
//! The built-in tables cover the well-known operators; deployments that need a
//! different set load one from YAML:
//!
//! ```yaml
//! networks:
//!   mainnet:
//!     - name: sv-1
//!       base_url: https://scan.sv-1.example.com/api/scan
//! ```

use std::{collections::BTreeMap, path::Path};

use api_client::{ApiError, ApiResult, EndpointCatalog};
use serde::{Deserialize, Serialize};
use shared_types::{Endpoint, Network};
use tokio::fs;
use tracing::{debug, info};

// Built-in operator tables as (name, base URL)
const MAINNET_ENDPOINTS: &[(&str, &str)] = &[
    (
        "Global-Synchronizer-Foundation",
        "https://scan.sv-1.global.canton.network.sync.global/api/scan",
    ),
    (
        "Digital-Asset-1",
        "https://scan.sv-1.global.canton.network.digitalasset.com/api/scan",
    ),
    (
        "Digital-Asset-2",
        "https://scan.sv-2.global.canton.network.digitalasset.com/api/scan",
    ),
    (
        "Cumberland-1",
        "https://scan.sv-1.global.canton.network.cumberland.io/api/scan",
    ),
];

const TESTNET_ENDPOINTS: &[(&str, &str)] = &[
    (
        "Global-Synchronizer-Foundation",
        "https://scan.sv-1.test.global.canton.network.sync.global/api/scan",
    ),
    (
        "Digital-Asset-1",
        "https://scan.sv-1.test.global.canton.network.digitalasset.com/api/scan",
    ),
    (
        "Digital-Asset-2",
        "https://scan.sv-2.test.global.canton.network.digitalasset.com/api/scan",
    ),
];

const DEVNET_ENDPOINTS: &[(&str, &str)] = &[
    (
        "Global-Synchronizer-Foundation",
        "https://scan.sv-1.dev.global.canton.network.sync.global/api/scan",
    ),
    (
        "Digital-Asset-1",
        "https://scan.sv-1.dev.global.canton.network.digitalasset.com/api/scan",
    ),
    (
        "Digital-Asset-2",
        "https://scan.sv-2.dev.global.canton.network.digitalasset.com/api/scan",
    ),
];

/// In-memory endpoint tables keyed by network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    /// Endpoints per network, in catalog order
    #[serde(default)]
    pub networks: BTreeMap<Network, Vec<Endpoint>>,
}

impl StaticCatalog {
    /// The built-in operator tables
    pub fn builtin() -> Self {
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .filter_map(|(name, url)| Endpoint::new(*name, url).ok())
                .collect::<Vec<_>>()
        };

        let networks = BTreeMap::from([
            (Network::MainNet, table(MAINNET_ENDPOINTS)),
            (Network::TestNet, table(TESTNET_ENDPOINTS)),
            (Network::DevNet, table(DEVNET_ENDPOINTS)),
        ]);

        Self { networks }
    }

    /// Replace the table for one network
    #[must_use]
    pub fn with_endpoints(mut self, network: Network, endpoints: Vec<Endpoint>) -> Self {
        self.networks.insert(network, endpoints);
        self
    }

    /// Parse a catalog from YAML
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the document is malformed or lists an
    /// invalid endpoint
    pub fn from_yaml(content: &str) -> ApiResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ApiError::configuration(format!("invalid endpoint catalog: {e}")))
    }

    /// Load a catalog from a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the file cannot be read or parsed
    pub async fn from_file<P: AsRef<Path>>(path: P) -> ApiResult<Self> {
        let path = path.as_ref();
        debug!("Loading endpoint catalog from: {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|e| {
            ApiError::configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_yaml(&content)?;

        info!(
            "Loaded endpoint catalog with {} networks from {}",
            catalog.networks.len(),
            path.display()
        );

        Ok(catalog)
    }
}

impl EndpointCatalog for StaticCatalog {
    fn list(&self, network: Network, _provider_hint: Option<&str>) -> Vec<Endpoint> {
        self.networks.get(&network).cloned().unwrap_or_default()
    }
}
