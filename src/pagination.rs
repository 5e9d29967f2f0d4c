// ABOUTME: Re-exports the cursor codec from fooddata-core for unified type identity
// ABOUTME: Ensures PageRequest and CursorError are the same type across all workspace crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use fooddata_core::pagination::*;
