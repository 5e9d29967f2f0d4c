// ABOUTME: Core types and constants for the FoodData Central gateway
// ABOUTME: Foundation crate with error handling, cursor pagination, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # `FoodData` Core
//!
//! Foundation crate providing shared types and constants for the `FoodData`
//! Central gateway. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: `AppError`/`ErrorCode` plus the upstream, cursor and resolution errors
//! - **constants**: Upstream limits, scheduler defaults and tool identifiers
//! - **pagination**: Opaque, tool-scoped pagination cursors

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Opaque cursor codec for paged tool calls
pub mod pagination;
