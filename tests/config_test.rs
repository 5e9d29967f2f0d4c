// ABOUTME: Tests for FoodData Central configuration loading from the environment
// ABOUTME: Covers defaults, credential fallback, unparseable values, validation and log settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use fooddata_mcp_server::config::FdcConfig;
use fooddata_mcp_server::errors::ErrorCode;
use fooddata_mcp_server::external::UsdaClient;
use fooddata_mcp_server::logging::{LogFormat, LoggingConfig};
use serial_test::serial;

const VARS: [&str; 9] = [
    "USDA_API_KEY",
    "FDC_API_KEY",
    "FDC_BASE_URL",
    "FDC_MAX_CONCURRENT",
    "FDC_MIN_INTERVAL_MS",
    "FDC_MAX_RETRIES",
    "FDC_RETRY_BASE_DELAY_MS",
    "FDC_TIMEOUT_SECS",
    "RUST_LOG",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_with_only_api_key() {
    clear_env();
    env::set_var("USDA_API_KEY", "primary-key");

    let config = FdcConfig::from_env().unwrap();
    assert_eq!(config.api_key, "primary-key");
    assert_eq!(config.base_url, "https://api.nal.usda.gov/fdc/v1");
    assert_eq!(config.max_concurrent, 1);
    assert_eq!(config.min_interval(), Duration::from_millis(400));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.retry_base_delay_ms, 750);
    assert_eq!(config.timeout(), Duration::from_secs(30));

    clear_env();
}

#[test]
#[serial]
fn test_fallback_key_and_overrides() {
    clear_env();
    env::set_var("FDC_API_KEY", "fallback-key");
    env::set_var("FDC_BASE_URL", "http://localhost:9999/fdc/v1");
    env::set_var("FDC_MAX_CONCURRENT", "3");
    env::set_var("FDC_MIN_INTERVAL_MS", "0");
    env::set_var("FDC_MAX_RETRIES", "5");
    env::set_var("FDC_TIMEOUT_SECS", "5");

    let config = FdcConfig::from_env().unwrap();
    assert_eq!(config.api_key, "fallback-key");
    assert_eq!(config.base_url, "http://localhost:9999/fdc/v1");
    assert_eq!(config.max_concurrent, 3);
    assert_eq!(config.min_interval_ms, 0);
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.timeout_secs, 5);

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back_to_defaults() {
    clear_env();
    env::set_var("USDA_API_KEY", "key");
    env::set_var("FDC_MAX_RETRIES", "lots");
    env::set_var("FDC_MIN_INTERVAL_MS", "-5");

    let config = FdcConfig::from_env().unwrap();
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.min_interval_ms, 400);

    clear_env();
}

#[test]
#[serial]
fn test_missing_api_key_is_config_error() {
    clear_env();
    let error = FdcConfig::from_env().unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigError);
    assert!(error.message.contains("USDA_API_KEY"));
}

#[test]
#[serial]
fn test_zero_concurrency_fails_validation() {
    clear_env();
    env::set_var("USDA_API_KEY", "key");
    env::set_var("FDC_MAX_CONCURRENT", "0");

    assert!(FdcConfig::from_env().is_err());

    clear_env();
}

#[test]
fn test_validation_rules() {
    assert!(FdcConfig::with_api_key("key").validate().is_ok());
    assert!(FdcConfig::with_api_key("  ").validate().is_err());

    let no_timeout = FdcConfig {
        timeout_secs: 0,
        ..FdcConfig::with_api_key("key")
    };
    assert!(no_timeout.validate().is_err());
    assert!(UsdaClient::new(&no_timeout).is_err());
}

#[test]
fn test_debug_output_redacts_api_key() {
    let config = FdcConfig::with_api_key("super-secret");
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("redacted"));
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    for var in ["RUST_LOG", "LOG_FORMAT", "LOG_INCLUDE_LOCATION", "SERVICE_NAME"] {
        env::remove_var(var);
    }

    let defaults = LoggingConfig::from_env();
    assert_eq!(defaults.level, "info");
    assert_eq!(defaults.format, LogFormat::Pretty);
    assert!(!defaults.include_location);
    assert_eq!(defaults.service_name, "fooddata-mcp-server");

    env::set_var("RUST_LOG", "debug");
    env::set_var("LOG_FORMAT", "json");
    env::set_var("LOG_INCLUDE_LOCATION", "1");
    env::set_var("SERVICE_NAME", "fdc-gateway");

    let config = LoggingConfig::from_env();
    assert_eq!(config.level, "debug");
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);
    assert_eq!(config.service_name, "fdc-gateway");

    for var in ["RUST_LOG", "LOG_FORMAT", "LOG_INCLUDE_LOCATION", "SERVICE_NAME"] {
        env::remove_var(var);
    }
}
