// ABOUTME: Single-attempt HTTP transport to FoodData Central with a wall-clock timeout
// ABOUTME: Normalizes HTTP statuses, in-band error envelopes and network faults into UpstreamError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fooddata_core::constants::fdc::API_KEY_PARAM;
use fooddata_core::errors::UpstreamError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

/// One upstream call: a JSON body POSTed to a path under the base URL
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    /// Short operation name for logs ("search", "foods", "list")
    pub operation: &'static str,
    /// Path relative to the base URL, with a leading slash
    pub path: String,
    /// JSON request body
    pub body: Value,
}

impl UpstreamRequest {
    /// Create a request
    #[must_use]
    pub fn new(operation: &'static str, path: impl Into<String>, body: Value) -> Self {
        Self {
            operation,
            path: path.into(),
            body,
        }
    }
}

/// Performs exactly one attempt of an upstream call.
///
/// Retries and scheduling live above this trait; implementations only
/// classify the outcome.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Issue the request and return the parsed JSON body
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport. The timeout bounds the whole attempt, body included.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            timeout,
        }
    }

    async fn send(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, request.path);
        let response = self
            .client
            .post(&url)
            .query(&[(API_KEY_PARAM, self.api_key.as_str())])
            .json(&request.body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(describe_reqwest_error(&e)))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(describe_reqwest_error(&e)))?;

        classify_response(status, &body, retry_after.as_deref())
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        debug!(
            operation = request.operation,
            path = %request.path,
            "Dispatching upstream request"
        );
        // Dropping the in-flight future on timeout cancels the request
        tokio::time::timeout(self.timeout, self.send(request))
            .await
            .unwrap_or_else(|_| Err(UpstreamError::timeout(self.timeout.as_secs())))
    }
}

/// Turn a status, body and optional `Retry-After` value into data or an error
///
/// # Errors
///
/// Returns an error for non-2xx statuses, unparseable 2xx bodies, and 2xx
/// bodies that carry an error envelope
pub fn classify_response(
    status: StatusCode,
    body: &str,
    retry_after: Option<&str>,
) -> Result<Value, UpstreamError> {
    let attach_hint = |error: UpstreamError| match retry_after {
        Some(raw) => {
            let delay_ms = parse_retry_after(raw, Utc::now())
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
            error.with_retry_after(raw, delay_ms)
        }
        None => error,
    };

    if !status.is_success() {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(envelope_message)
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| "request failed".to_owned());
        return Err(attach_hint(UpstreamError::from_status(
            status.as_u16(),
            message,
            Some(body.to_owned()),
        )));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        UpstreamError::malformed(format!("response is not valid JSON: {e}"), Some(body.to_owned()))
    })?;

    if let Some(error) = envelope_error(&value, body) {
        return Err(attach_hint(error));
    }
    Ok(value)
}

/// Extract an in-band `{error: {code, message, status?}}` envelope
fn envelope_error(value: &Value, body: &str) -> Option<UpstreamError> {
    let error = value.as_object()?.get("error")?;
    let raw_body = Some(body.to_owned());
    match error {
        Value::Object(fields) => {
            let code = fields.get("code").and_then(Value::as_str);
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("upstream reported an error");
            let status = fields.get("status").and_then(status_from_value);
            Some(UpstreamError::envelope(code, message, status, raw_body))
        }
        Value::String(message) => Some(UpstreamError::envelope(None, message.as_str(), None, raw_body)),
        _ => None,
    }
}

fn envelope_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    let message = match error {
        Value::String(message) => Some(message.as_str()),
        Value::Object(fields) => fields.get("message").and_then(Value::as_str),
        _ => None,
    }?;
    Some(match error.get("code").and_then(Value::as_str) {
        Some(code) => format!("{code}: {message}"),
        None => message.to_owned(),
    })
}

fn status_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP-date.
///
/// Dates in the past yield a zero delay.
#[must_use]
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn describe_reqwest_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        format!("connection failed: {error}")
    } else if error.is_timeout() {
        format!("connection timed out: {error}")
    } else {
        format!("request failed: {error}")
    }
}
