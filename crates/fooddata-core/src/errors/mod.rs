// ABOUTME: Unified error handling for the FoodData Central gateway
// ABOUTME: Defines ErrorCode/AppError and re-exports the upstream, cursor and resolution errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Domain errors (`UpstreamError`, `CursorError`, `ResolutionError`) carry the
//! precise failure for the layer that produced them. `AppError` is the single
//! type an outer tool layer renders: every domain error converts into it with
//! a stable `ErrorCode`.

/// Cursor decoding errors
pub mod cursor;
/// Nutrient resolution failures
pub mod resolution;
/// Errors raised while talking to the upstream API
pub mod upstream;

pub use cursor::CursorError;
pub use resolution::ResolutionError;
pub use upstream::{UpstreamError, UpstreamErrorKind};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Caller supplied an invalid argument
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// Opaque cursor could not be decoded for the requesting tool
    #[serde(rename = "INVALID_CURSOR")]
    InvalidCursor = 3004,

    // Resource Management (4000-4999)
    /// Upstream has no record for the identifier
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// Record exists but lacks data the resolution policy requires
    #[serde(rename = "INCOMPLETE_DATA")]
    IncompleteData = 4004,

    // External Services (5000-5999)
    /// Upstream returned a permanent failure
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Upstream stayed unavailable after retries
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// Upstream rejected the access credential
    #[serde(rename = "EXTERNAL_AUTH_FAILED")]
    ExternalAuthFailed = 5002,
    /// Upstream throttled us past the retry budget
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Configuration (6000-6999)
    /// Configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::InvalidCursor => 400,
            Self::ResourceNotFound => 404,
            Self::IncompleteData => 422,
            Self::ExternalServiceError => 502,
            Self::ExternalServiceUnavailable | Self::ExternalAuthFailed | Self::ExternalRateLimited => {
                503
            }
            Self::ConfigError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidCursor => "The pagination cursor is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::IncompleteData => "The record is missing required nutrient data",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ExternalAuthFailed => "Authentication with external service failed",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, thiserror::Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<UpstreamError> for AppError {
    fn from(error: UpstreamError) -> Self {
        let code = match (error.kind(), error.http_status()) {
            (UpstreamErrorKind::Validation, _) => ErrorCode::InvalidInput,
            (_, Some(404)) | (UpstreamErrorKind::NotFound, _) => ErrorCode::ResourceNotFound,
            (_, Some(401 | 403)) => ErrorCode::ExternalAuthFailed,
            (_, Some(429)) => ErrorCode::ExternalRateLimited,
            _ if error.is_retryable() => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<CursorError> for AppError {
    fn from(error: CursorError) -> Self {
        Self::new(ErrorCode::InvalidCursor, error.to_string()).with_source(error)
    }
}

impl From<ResolutionError> for AppError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Upstream(upstream) => upstream.into(),
            incomplete @ ResolutionError::IncompleteCoreNutrients { .. } => {
                Self::new(ErrorCode::IncompleteData, incomplete.to_string()).with_source(incomplete)
            }
        }
    }
}
