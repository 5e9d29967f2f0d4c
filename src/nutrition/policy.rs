// ABOUTME: Decides which unresolved nutrients make a resolution fail outright
// ABOUTME: Default policy refuses Foundation records with missing macros
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use fooddata_core::constants::fdc::FOUNDATION_DATA_TYPE;

use super::definitions::NutrientKey;
use crate::external::FoodRecord;

/// Predicate over a resolved record and the keys still missing after every attempt
pub trait ResolutionPolicy: Send + Sync {
    /// Subset of `missing` that must fail the resolution instead of being reported
    fn fatal_missing(&self, record: &FoodRecord, missing: &[NutrientKey]) -> Vec<NutrientKey>;
}

/// Partially published macro data on a chosen dataset is an error, not a partial answer
#[derive(Debug, Clone)]
pub struct FoundationMacroPolicy {
    data_type: String,
    required: Vec<NutrientKey>,
}

impl FoundationMacroPolicy {
    /// Require `required` on records whose data type equals `data_type` (case-insensitive)
    #[must_use]
    pub fn new(data_type: impl Into<String>, required: impl IntoIterator<Item = NutrientKey>) -> Self {
        Self {
            data_type: data_type.into(),
            required: required.into_iter().collect(),
        }
    }
}

impl Default for FoundationMacroPolicy {
    fn default() -> Self {
        Self::new(FOUNDATION_DATA_TYPE, NutrientKey::CORE_MACROS)
    }
}

impl ResolutionPolicy for FoundationMacroPolicy {
    fn fatal_missing(&self, record: &FoodRecord, missing: &[NutrientKey]) -> Vec<NutrientKey> {
        let applies = record
            .data_type()
            .is_some_and(|data_type| data_type.eq_ignore_ascii_case(&self.data_type));
        if !applies {
            return Vec::new();
        }
        missing
            .iter()
            .copied()
            .filter(|key| self.required.contains(key))
            .collect()
    }
}

/// Never fails; every missing key is reported as missing
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientPolicy;

impl ResolutionPolicy for LenientPolicy {
    fn fatal_missing(&self, _record: &FoodRecord, _missing: &[NutrientKey]) -> Vec<NutrientKey> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foundation_macros_are_fatal() {
        let record = FoodRecord::new(json!({"fdcId": 1, "dataType": "Foundation"}));
        let fatal = FoundationMacroPolicy::default().fatal_missing(
            &record,
            &[NutrientKey::Protein, NutrientKey::VitaminC],
        );
        assert_eq!(fatal, vec![NutrientKey::Protein]);
    }

    #[test]
    fn test_other_datasets_never_fatal() {
        let record = FoodRecord::new(json!({"fdcId": 1, "dataType": "Branded"}));
        let fatal = FoundationMacroPolicy::default().fatal_missing(&record, &[NutrientKey::Protein]);
        assert!(fatal.is_empty());
    }
}
