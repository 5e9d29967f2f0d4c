// ABOUTME: Nutrient resolution over FoodData Central records
// ABOUTME: Static definitions, label fallback, failure policy and the escalating resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Nutrient Resolution
//!
//! Maps requested nutrient keys onto the values carried by a record, fetching
//! broader record formats until every key is matched or the attempts run out.

/// Static nutrient keys, units and identifiers
pub mod definitions;
/// Free-form label block lookup
pub mod labels;
/// Which missing nutrients fail a resolution
pub mod policy;
/// Escalating resolver
pub mod resolver;

pub use definitions::{NutrientDefinition, NutrientKey, NutrientUnit, UnknownNutrient};
pub use policy::{FoundationMacroPolicy, LenientPolicy, ResolutionPolicy};
pub use resolver::{
    plan_attempts, MatchSource, NutrientMatch, NutrientResolution, NutrientResolver,
};
