// ABOUTME: FoodData Central client configuration types
// ABOUTME: Environment loading with typed defaults and startup validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::str::FromStr;
use std::time::Duration;

use fooddata_core::constants::{fdc, limits};
use fooddata_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Primary environment variable for the access credential
const API_KEY_ENV: &str = "USDA_API_KEY";
/// Fallback environment variable for the access credential
const API_KEY_FALLBACK_ENV: &str = "FDC_API_KEY";

/// USDA `FoodData` Central client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct FdcConfig {
    /// API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL for the API (default: <https://api.nal.usda.gov/fdc/v1>)
    pub base_url: String,
    /// Maximum upstream calls in flight at once
    pub max_concurrent: usize,
    /// Minimum spacing between two dispatches, in milliseconds
    pub min_interval_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FdcConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: fdc::DEFAULT_BASE_URL.to_owned(),
            max_concurrent: limits::DEFAULT_MAX_CONCURRENT,
            min_interval_ms: limits::DEFAULT_MIN_INTERVAL_MS,
            max_retries: limits::DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: limits::DEFAULT_RETRY_BASE_DELAY_MS,
            timeout_secs: limits::DEFAULT_TIMEOUT_SECS,
        }
    }
}

// The API key never reaches logs
impl std::fmt::Debug for FdcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdcConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_concurrent", &self.max_concurrent)
            .field("min_interval_ms", &self.min_interval_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FdcConfig {
    /// Create a configuration with defaults and the given API key
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment
    ///
    /// Numeric variables that fail to parse fall back to their default.
    ///
    /// # Errors
    ///
    /// Returns a config error if no API key is set or the result fails validation
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(API_KEY_ENV)
            .or_else(|_| env::var(API_KEY_FALLBACK_ENV))
            .map_err(|_| {
                AppError::config(format!(
                    "{API_KEY_ENV} (or {API_KEY_FALLBACK_ENV}) must be set"
                ))
            })?;

        let config = Self {
            api_key,
            base_url: env_var_or("FDC_BASE_URL", fdc::DEFAULT_BASE_URL),
            max_concurrent: env_parse_or("FDC_MAX_CONCURRENT", limits::DEFAULT_MAX_CONCURRENT),
            min_interval_ms: env_parse_or("FDC_MIN_INTERVAL_MS", limits::DEFAULT_MIN_INTERVAL_MS),
            max_retries: env_parse_or("FDC_MAX_RETRIES", limits::DEFAULT_MAX_RETRIES),
            retry_base_delay_ms: env_parse_or(
                "FDC_RETRY_BASE_DELAY_MS",
                limits::DEFAULT_RETRY_BASE_DELAY_MS,
            ),
            timeout_secs: env_parse_or("FDC_TIMEOUT_SECS", limits::DEFAULT_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the client relies on
    ///
    /// # Errors
    ///
    /// Returns a config error for an empty key or base URL, zero concurrency,
    /// or a zero timeout
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::config("FoodData Central API key is empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(AppError::config("FoodData Central base URL is empty"));
        }
        if self.max_concurrent == 0 {
            return Err(AppError::config("FDC_MAX_CONCURRENT must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::config("FDC_TIMEOUT_SECS must be at least 1"));
        }
        Ok(())
    }

    /// Minimum dispatch spacing
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Per-attempt timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(
                variable = key,
                value = %raw,
                fallback = %default,
                "Ignoring unparseable configuration value"
            );
            default
        }),
        Err(_) => default,
    }
}
