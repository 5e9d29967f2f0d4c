// ABOUTME: External API client modules (USDA FoodData Central)
// ABOUTME: Scheduling, retries, transport, alias substitution and the client facade

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! External API Clients
//!
//! Everything needed to talk to the `FoodData` Central REST API under one
//! shared rate budget.

/// Retired record identifiers and their maintained replacements
pub mod aliases;
/// Global FIFO request scheduler
pub mod limiter;
/// Request and response types for the upstream API
pub mod models;
/// Jittered exponential backoff
pub mod retry;
/// Single-attempt HTTP transport and response classification
pub mod transport;
/// Client facade over scheduler, retries and transport
pub mod usda_client;

// Re-export commonly used types
pub use aliases::{AliasEntry, AliasProvenance, AliasTable};
pub use limiter::{LimiterPermit, RequestLimiter};
pub use models::{
    DataType, FoodFormat, FoodQuery, FoodRecord, FoodSummary, ListPage, ListRequest,
    ResolvedFood, SearchPage, SearchRequest, SearchResult, SortField, SortOrder,
};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, UpstreamRequest, UpstreamTransport};
pub use usda_client::UsdaClient;
