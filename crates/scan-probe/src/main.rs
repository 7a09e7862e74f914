// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Scan probe
//!
//! Sends one request through the multi-endpoint dispatcher and reports which operator
//! answered. Configuration comes from `dispatch.*` and `DISPATCH_` variables; the first
//! argument overrides the probed path.

use anyhow::{Context, Result};
use api_client::HttpMethod;
use dispatch::{DispatchConfig, RequestOptions, ScanClient};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PROBE_PATH: &str = "/v0/version";

/// Response of the scan version endpoint
#[derive(Debug, Deserialize)]
struct ScanVersion {
    version: String,
    commit_ts: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DispatchConfig::from_env().context("invalid dispatch configuration")?;
    let client = ScanClient::from_config(&config)
        .await
        .context("failed to build scan client")?;

    let snapshot = client.snapshot();
    info!(
        network = %client.network(),
        endpoints = snapshot.endpoints.len(),
        "probing scan API"
    );

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PROBE_PATH.to_string());

    let body: Value = client
        .perform_raw(HttpMethod::Get, &path, None, &RequestOptions::default())
        .await
        .with_context(|| format!("probe of {path} failed"))?;

    let snapshot = client.snapshot();
    let answered = snapshot
        .endpoints
        .get(snapshot.current)
        .map_or_else(|| "-".to_string(), ToString::to_string);

    match serde_json::from_value::<ScanVersion>(body.clone()) {
        Ok(version) => info!(
            version = %version.version,
            commit_ts = version.commit_ts.as_deref().unwrap_or("-"),
            endpoint = %answered,
            "scan API reachable"
        ),
        Err(_) => info!(endpoint = %answered, response = %body, "scan API reachable"),
    }

    if !snapshot.failed.is_empty() {
        warn!(failed = ?snapshot.failed, "some endpoints failed during the probe");
    }

    Ok(())
}
