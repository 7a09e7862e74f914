// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory collaborators for unit tests

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use api_client::{
    ApiError, ApiResult, AttemptRecord, LogicalRequest, RequestLogger, Transport,
    TransportResponse,
};
use mockall::mock;
use serde_json::Value;

mock! {
    pub Logger {}

    impl RequestLogger for Logger {
        fn record(&self, record: &AttemptRecord);
    }
}

/// A logger that accepts any number of records
pub fn quiet_logger() -> Arc<dyn RequestLogger> {
    let mut logger = MockLogger::new();
    logger.expect_record().returning(|_| ());
    Arc::new(logger)
}

/// A logger that must see exactly `times` records
pub fn counting_logger(times: usize) -> Arc<dyn RequestLogger> {
    let mut logger = MockLogger::new();
    logger.expect_record().times(times).returning(|_| ());
    Arc::new(logger)
}

/// Transport replaying a fixed script of outcomes in call order
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<ApiResult<Value>>>>,
    sent: Arc<Mutex<Vec<(String, LogicalRequest)>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = ApiResult<Value>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            sent: Arc::default(),
        }
    }

    /// Every `(url, request)` pair sent so far
    pub fn requests(&self) -> Vec<(String, LogicalRequest)> {
        self.sent.lock().unwrap().clone()
    }

    /// URLs sent so far, in order
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, request: &LogicalRequest) -> ApiResult<TransportResponse> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), request.clone()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(body)) => Ok(TransportResponse { status: 200, body }),
            Some(Err(error)) => Err(error),
            None => Err(ApiError::transport("script exhausted")),
        }
    }
}
