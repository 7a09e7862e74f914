// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `LedgerApiClient` and `ScanClient`
//!
//! These tests run both clients over real HTTP against wiremock servers, one server
//! per mock operator.

use std::{sync::Arc, time::Duration};

use api_client::{
    ApiError, ApiResult, HttpMethod, RetryConfigUpdate,
    classify::{SEQUENCER_BACKPRESSURE, UNKNOWN_CONTRACT_SYNCHRONIZERS},
};
use dispatch::{
    DispatchConfig, HttpTransport, LedgerApiClient, RequestOptions, StaticToken,
    TracingRequestLogger,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

use fixtures::*;

fn ledger_client(server: &MockServer, config: &DispatchConfig) -> LedgerApiClient {
    LedgerApiClient::new(
        server.uri(),
        config,
        HttpTransport::new(TEST_TIMEOUT, "dispatch-tests").unwrap(),
        StaticToken::new("test-token"),
        Arc::new(TracingRequestLogger),
    )
    .unwrap()
}

async fn command_ids(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| serde_json::from_slice::<Value>(&request.body).unwrap()["commandId"].clone())
        .collect()
}

/// A retry budget of n allows exactly n + 1 attempts
#[tokio::test]
async fn ledger_retries_until_budget_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/state/ledger-end"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .named("ledger end unavailable")
        .mount(&server)
        .await;

    let mut client = ledger_client(&server, &fast_config());
    client.set_retry_config(&RetryConfigUpdate::default().max_retries(2));

    let result: ApiResult<Value> = client
        .perform_request(HttpMethod::Get, "/v2/state/ledger-end", None, &RequestOptions::default())
        .await;

    assert_eq!(result.unwrap_err().status(), Some(503));
}

/// Transient failures followed by success return the success
#[tokio::test]
async fn ledger_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/state/ledger-end"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .named("transient failure")
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/state/ledger-end"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"offset": 17})))
        .expect(1)
        .named("success after retry")
        .mount(&server)
        .await;

    let client = ledger_client(&server, &fast_config());
    let body: Value = client
        .perform_request(HttpMethod::Get, "/v2/state/ledger-end", None, &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(body["offset"], 17);
}

/// Each resubmission carries a freshly suffixed command id
#[tokio::test]
async fn ledger_rewrites_command_id_on_every_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/commands/submit-and-wait"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(error_body(SEQUENCER_BACKPRESSURE, "sequencer overloaded")),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/commands/submit-and-wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updateId": "u-1"})))
        .mount(&server)
        .await;

    let client = ledger_client(&server, &fast_config());
    let body: Value = client
        .perform_request(
            HttpMethod::Post,
            "/v2/commands/submit-and-wait",
            Some(json!({"commandId": "abc", "actAs": ["alice"]})),
            &RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(body["updateId"], "u-1");
    assert_eq!(
        command_ids(&server).await,
        vec![json!("abc"), json!("abc-retry"), json!("abc-retry-retry")]
    );
}

/// Stale synchronizer views are retried on the same host
#[tokio::test]
async fn ledger_retries_unknown_contract_synchronizers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/commands/submit-and-wait"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": UNKNOWN_CONTRACT_SYNCHRONIZERS, "message": "stale"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/commands/submit-and-wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = ledger_client(&server, &fast_config());
    let result: ApiResult<Value> = client
        .perform_request(
            HttpMethod::Post,
            "/v2/commands/submit-and-wait",
            Some(json!({"commandId": "c-7"})),
            &RequestOptions::default(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(command_ids(&server).await, vec![json!("c-7"), json!("c-7-retry")]);
}

/// Client errors and rate limits are terminal on a single endpoint
#[tokio::test]
async fn ledger_does_not_retry_fatal_errors() {
    for status in [400, 401, 404, 429] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let client = ledger_client(&server, &fast_config());
        let error = client
            .perform_request::<Value>(
                HttpMethod::Get,
                "/v2/parties",
                None,
                &RequestOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(status));
    }
}

/// A failing operator is skipped and the next one answers
#[tokio::test]
async fn scan_rotates_to_healthy_operator() {
    let operators = OperatorFixture::start(3).await;
    operators
        .respond(0, "/v0/dso", ResponseTemplate::new(503))
        .await;
    operators
        .respond(1, "/v0/dso", ResponseTemplate::new(200).set_body_json(dso_response()))
        .await;

    let client = operators.client(&fast_config());
    let dso: Value = client
        .perform_request(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(dso["voting_threshold"], 3);
    assert_eq!(operators.hits(0).await, 1);
    assert_eq!(operators.hits(1).await, 1);
    assert_eq!(operators.hits(2).await, 0);

    // The operator that answered is tried first next time
    client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(operators.hits(0).await, 1);
    assert_eq!(operators.hits(1).await, 2);
}

/// Rate limits rotate when several operators are available
#[tokio::test]
async fn scan_rotates_on_rate_limit() {
    let operators = OperatorFixture::start(2).await;
    operators
        .respond(0, "/v0/dso", ResponseTemplate::new(429))
        .await;
    operators
        .respond(1, "/v0/dso", ResponseTemplate::new(200).set_body_json(dso_response()))
        .await;

    let client = operators.client(&fast_config());
    let result: ApiResult<Value> = client
        .perform_request(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await;

    assert!(result.is_ok());
    assert_eq!(client.snapshot().failed, vec![0]);
}

/// A fatal answer stops rotation immediately
#[tokio::test]
async fn scan_stops_on_fatal_error() {
    let operators = OperatorFixture::start(3).await;
    operators
        .respond(0, "/v0/rounds/9", ResponseTemplate::new(404))
        .await;

    let client = operators.client(&fast_config());
    let error = client
        .perform_request::<Value>(HttpMethod::Get, "/v0/rounds/9", None, &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(operators.hits(1).await + operators.hits(2).await, 0);
    assert!(client.snapshot().failed.is_empty());
}

/// When every operator fails, the last error is returned and the next call starts over
#[tokio::test]
async fn scan_self_heals_after_total_failure() {
    let operators = OperatorFixture::start(2).await;
    for index in 0..2 {
        operators
            .respond(
                index,
                "/v0/dso",
                ResponseTemplate::new(500).set_body_json(error_body("INTERNAL", "boom")),
            )
            .await;
    }

    let client = operators.client(&fast_config());
    let error = client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(500));
    assert_eq!(client.snapshot().failed, vec![0, 1]);

    client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(operators.hits(0).await, 2);
}

/// Failure marks expire after the reset window
#[tokio::test]
async fn scan_forgets_failures_after_reset_window() {
    let operators = OperatorFixture::start(2).await;
    Mock::given(method("GET"))
        .and(path(format!("{MOUNT}/v0/dso")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&operators.servers[0])
        .await;
    for index in 0..2 {
        operators
            .respond(index, "/v0/dso", ResponseTemplate::new(200).set_body_json(dso_response()))
            .await;
    }

    let config = DispatchConfig {
        reset_window_secs: 1,
        ..fast_config()
    };
    let client = operators.client(&config);

    client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(client.snapshot().failed, vec![0]);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap();
    assert!(client.snapshot().failed.is_empty());
}

/// A URL bound to one operator is re-targeted at the others
#[tokio::test]
async fn scan_retargets_absolute_urls() {
    let operators = OperatorFixture::start(2).await;
    operators
        .respond(0, "/v0/dso", ResponseTemplate::new(502))
        .await;
    operators
        .respond(1, "/v0/dso", ResponseTemplate::new(200).set_body_json(dso_response()))
        .await;

    let client = operators.client(&fast_config());
    let url = format!("{}/v0/dso", operators.base_url(0));
    let result: ApiResult<Value> = client
        .perform_request(HttpMethod::Get, &url, None, &RequestOptions::default())
        .await;

    assert!(result.is_ok());
    assert_eq!(operators.hits(1).await, 1);
}

/// An unreachable operator counts as a retryable failure
#[tokio::test]
async fn scan_rotates_past_unreachable_operator() {
    let operators = OperatorFixture::start(1).await;
    operators
        .respond(0, "/v0/dso", ResponseTemplate::new(200).set_body_json(dso_response()))
        .await;

    let dead = shared_types::Endpoint::new("dead", "http://127.0.0.1:1/api/scan").unwrap();
    let mut endpoints = vec![dead];
    endpoints.extend(operators.endpoints());
    let catalog = dispatch::StaticCatalog::default()
        .with_endpoints(shared_types::Network::DevNet, endpoints);

    let client = dispatch::ScanClient::new(
        &fast_config(),
        &catalog,
        HttpTransport::new(TEST_TIMEOUT, "dispatch-tests").unwrap(),
        dispatch::Unauthenticated,
        Arc::new(TracingRequestLogger),
    );

    let result: ApiResult<Value> = client
        .perform_request(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await;

    assert!(result.is_ok());
    assert_eq!(client.snapshot().current, 1);
}

/// No configured operators is a configuration error, not a network error
#[tokio::test]
async fn scan_without_operators_fails_fast() {
    let operators = OperatorFixture::start(0).await;
    let client = operators.client(&fast_config());

    let error = client
        .perform_request::<Value>(HttpMethod::Get, "/v0/dso", None, &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Configuration { .. }));
}
