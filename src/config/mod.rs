// ABOUTME: Configuration management for the FoodData Central gateway
// ABOUTME: Loads upstream, scheduler, retry and timeout settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration module for the `FoodData` MCP Server
//!
//! Settings are read once, when a client is constructed:
//!
//! - **Upstream**: base URL and access credential
//! - **Scheduling**: concurrency ceiling and minimum dispatch spacing
//! - **Retry**: retry count and backoff base delay
//! - **Transport**: per-attempt wall-clock timeout

/// `FoodData` Central client configuration
pub mod fdc;

pub use fdc::FdcConfig;
