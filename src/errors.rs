// ABOUTME: Re-exports the error types from fooddata-core
// ABOUTME: Upstream, cursor and resolution errors plus the unified AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use fooddata_core::errors::*;
