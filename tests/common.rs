// ABOUTME: Shared test utilities for FoodData Central client integration tests
// ABOUTME: Provides a scripted in-memory transport, record builders and client setup helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `fooddata_mcp_server`

use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use fooddata_mcp_server::errors::UpstreamError;
use fooddata_mcp_server::external::{
    RequestLimiter, RetryPolicy, UpstreamRequest, UpstreamTransport, UsdaClient,
};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });
}

type Handler = dyn Fn(&UpstreamRequest) -> Result<Value, UpstreamError> + Send + Sync;

/// Transport answering from a closure and recording every request
pub struct FakeTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&UpstreamRequest) -> Result<Value, UpstreamError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Serves `/foods` from `records`, returning only the ids that exist
    pub fn with_records(records: Vec<Value>) -> Arc<Self> {
        Self::new(move |request| Ok(lookup_records(&records, &request.body)))
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl UpstreamTransport for FakeTransport {
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

/// `fdcIds` of a batch request body
pub fn requested_ids(body: &Value) -> Vec<u64> {
    body["fdcIds"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default()
}

/// Records from `records` whose id was requested, in store order
pub fn lookup_records(records: &[Value], body: &Value) -> Value {
    let wanted: HashSet<u64> = requested_ids(body).into_iter().collect();
    Value::Array(
        records
            .iter()
            .filter(|record| record["fdcId"].as_u64().is_some_and(|id| wanted.contains(&id)))
            .cloned()
            .collect(),
    )
}

/// Client over `transport` with no spacing and no retries
pub fn fast_client(transport: Arc<FakeTransport>) -> UsdaClient {
    UsdaClient::with_transport(transport)
        .with_limiter(RequestLimiter::new(1, Duration::ZERO))
        .with_retry_policy(RetryPolicy::none())
}

/// Food record with structured nutrient rows
pub fn food(fdc_id: u64, data_type: &str, nutrients: Vec<Value>) -> Value {
    json!({
        "fdcId": fdc_id,
        "description": format!("Food {fdc_id}"),
        "dataType": data_type,
        "foodNutrients": nutrients,
    })
}

/// Abridged-format nutrient row keyed by legacy nutrient number
pub fn abridged_row(number: &str, name: &str, amount: f64, unit: &str) -> Value {
    json!({
        "number": number,
        "name": name,
        "amount": amount,
        "unitName": unit,
    })
}

/// Full-format nutrient row with a nested nutrient object
pub fn full_row(id: u32, number: &str, name: &str, amount: f64, unit: &str) -> Value {
    json!({
        "id": 2_000_000 + u64::from(id),
        "amount": amount,
        "nutrient": {
            "id": id,
            "number": number,
            "name": name,
            "unitName": unit,
        },
    })
}
