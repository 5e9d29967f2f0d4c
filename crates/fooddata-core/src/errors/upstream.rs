// ABOUTME: Typed error for failed upstream calls with retryability classification
// ABOUTME: Covers HTTP status failures, in-band error envelopes, timeouts and transport faults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::error::Error;
use std::fmt;

/// Which layer produced an [`UpstreamError`]
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Non-2xx HTTP response
    Http,
    /// 2xx response whose body is an `{error: {...}}` envelope
    Envelope,
    /// The request exceeded its wall-clock timeout and was cancelled
    Timeout,
    /// Connection-level failure before a response was read
    Transport,
    /// 2xx response whose body could not be interpreted
    MalformedResponse,
    /// The upstream (or a batch reply) does not contain the requested record
    NotFound,
    /// Request rejected locally before it was scheduled
    Validation,
}

/// Failure of a single upstream operation.
///
/// Immutable once constructed. `retryable` is decided at construction from the
/// HTTP status (429 and 5xx), or from the kind (timeouts and transport faults
/// always retry; validation and malformed bodies never do).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    kind: UpstreamErrorKind,
    message: String,
    http_status: Option<u16>,
    retryable: bool,
    suggested_delay_ms: Option<u64>,
    retry_after: Option<String>,
    raw_body: Option<String>,
}

/// Status codes worth retrying: throttling and server-side faults
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    status == 429 || (status >= 500 && status < 600)
}

impl UpstreamError {
    const fn base(kind: UpstreamErrorKind, message: String, retryable: bool) -> Self {
        Self {
            kind,
            message,
            http_status: None,
            retryable,
            suggested_delay_ms: None,
            retry_after: None,
            raw_body: None,
        }
    }

    /// Non-2xx HTTP response
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>, raw_body: Option<String>) -> Self {
        let kind = if status == 404 {
            UpstreamErrorKind::NotFound
        } else {
            UpstreamErrorKind::Http
        };
        Self {
            http_status: Some(status),
            raw_body,
            ..Self::base(kind, message.into(), is_retryable_status(status))
        }
    }

    /// In-band `{error: {code, message, status?}}` envelope on a 2xx response.
    ///
    /// The embedded status classifies the error when present; otherwise a
    /// rate-limit code is treated like a 429.
    #[must_use]
    pub fn envelope(
        code: Option<&str>,
        message: impl Into<String>,
        status: Option<u16>,
        raw_body: Option<String>,
    ) -> Self {
        let rate_limited = code.is_some_and(|c| c.to_ascii_uppercase().contains("RATE_LIMIT"));
        let retryable = status.map_or(rate_limited, is_retryable_status);
        let message = match code {
            Some(code) => format!("{code}: {}", message.into()),
            None => message.into(),
        };
        Self {
            http_status: status,
            raw_body,
            ..Self::base(UpstreamErrorKind::Envelope, message, retryable)
        }
    }

    /// Request cancelled by its timeout
    #[must_use]
    pub fn timeout(after_secs: u64) -> Self {
        Self::base(
            UpstreamErrorKind::Timeout,
            format!("request timed out after {after_secs}s"),
            true,
        )
    }

    /// Connection reset, DNS failure and similar
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::base(UpstreamErrorKind::Transport, message.into(), true)
    }

    /// Body that is neither valid data nor a recognized error envelope
    #[must_use]
    pub fn malformed(message: impl Into<String>, raw_body: Option<String>) -> Self {
        Self {
            raw_body,
            ..Self::base(UpstreamErrorKind::MalformedResponse, message.into(), false)
        }
    }

    /// Record absent from the upstream reply
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            http_status: Some(404),
            ..Self::base(UpstreamErrorKind::NotFound, message.into(), false)
        }
    }

    /// Invalid request caught before scheduling
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::base(UpstreamErrorKind::Validation, message.into(), false)
    }

    /// Attach the upstream's `Retry-After` hint.
    ///
    /// `raw` is kept verbatim; `delay_ms` is the parsed value when the hint
    /// could be interpreted. Both are advisory and only rendered in messages.
    #[must_use]
    pub fn with_retry_after(mut self, raw: impl Into<String>, delay_ms: Option<u64>) -> Self {
        self.retry_after = Some(raw.into());
        self.suggested_delay_ms = delay_ms;
        self
    }

    /// Layer that produced the error
    #[must_use]
    pub const fn kind(&self) -> UpstreamErrorKind {
        self.kind
    }

    /// Human-readable message without status decoration
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, when one is known
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Whether the retry loop may try again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Delay suggested by the upstream, in milliseconds
    #[must_use]
    pub const fn suggested_delay_ms(&self) -> Option<u64> {
        self.suggested_delay_ms
    }

    /// Raw `Retry-After` header value
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        self.retry_after.as_deref()
    }

    /// Raw response body, when one was read
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// 404-class failure, eligible for alias substitution
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == UpstreamErrorKind::NotFound || self.http_status == Some(404)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USDA FoodData Central: {}", self.message)?;
        if let Some(status) = self.http_status {
            write!(f, " (HTTP {status})")?;
        }
        match (self.suggested_delay_ms, self.retry_after.as_deref()) {
            (Some(ms), _) => write!(f, "; upstream suggests retrying in {}s", ms.div_ceil(1000)),
            (None, Some(raw)) => write!(f, "; upstream sent Retry-After: {raw}"),
            (None, None) => Ok(()),
        }
    }
}

impl Error for UpstreamError {}
