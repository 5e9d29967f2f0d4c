// ABOUTME: Main library entry point for the FoodData Central gateway core
// ABOUTME: Rate-limited USDA client, alias substitution and nutrient resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # `FoodData` MCP Server
//!
//! Outbound request governance and nutrient resolution for the USDA
//! `FoodData` Central API, meant to sit behind an MCP tool layer.
//!
//! ## Architecture
//!
//! - **External**: request scheduler, retry policy, HTTP transport, alias
//!   table and the [`external::UsdaClient`] facade composing them
//! - **Nutrition**: nutrient definitions and the escalating
//!   [`nutrition::NutrientResolver`]
//! - **Pagination**: opaque cursors binding a tool name to a page position
//! - **Config** and **Logging**: environment-driven setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! use fooddata_mcp_server::config::FdcConfig;
//! use fooddata_mcp_server::errors::AppResult;
//! use fooddata_mcp_server::external::UsdaClient;
//! use fooddata_mcp_server::nutrition::{NutrientKey, NutrientResolver};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = FdcConfig::from_env()?;
//!     let client = Arc::new(UsdaClient::new(&config)?);
//!     let resolver = NutrientResolver::new(client);
//!
//!     let keys = BTreeSet::from([NutrientKey::Calories, NutrientKey::Protein]);
//!     let resolution = resolver.resolve(171_688, &keys).await?;
//!     println!("{:?}", resolution.matches);
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the environment
pub mod config;

/// Error types shared with `fooddata-core`
pub mod errors;

/// USDA `FoodData` Central client stack
pub mod external;

/// Structured logging setup
pub mod logging;

/// Nutrient definitions and resolution
pub mod nutrition;

/// Opaque pagination cursors
pub mod pagination;
