// ABOUTME: Nutrient resolution engine escalating through query shapes until all keys are found
// ABOUTME: Matches structured nutrient rows by id or name, then falls back to the label block
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Nutrient Resolution
//!
//! A resolution call walks an ordered list of [`FoodQuery`] shapes:
//!
//! 1. abridged, filtered to the union of the requested nutrients' ids
//! 2. full, unfiltered
//! 3. abridged, unfiltered
//!
//! After each successful fetch the record's structured nutrient rows are
//! scanned, then its label block for anything still missing. The loop
//! stops as soon as every key is matched. Matches found by an earlier
//! attempt are kept when a later attempt is needed for the remaining keys.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use fooddata_core::errors::{ResolutionError, UpstreamError};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::definitions::{NutrientKey, NutrientUnit};
use super::labels::{numeric_value, LabelLookup};
use super::policy::{FoundationMacroPolicy, ResolutionPolicy};
use crate::external::{AliasProvenance, FoodQuery, FoodRecord, UsdaClient};

/// Statuses the upstream returns when a nutrient filter list is too long
const FILTER_REJECTION_STATUSES: [u16; 3] = [400, 413, 414];

/// Where a value was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Structured `foodNutrients` row
    NutrientList,
    /// Free-form label block
    LabelBlock,
}

/// One resolved nutrient value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientMatch {
    /// Amount per the record's basis (usually 100 g or one serving)
    pub value: f64,
    /// Unit of the definition the value was matched against
    pub unit: NutrientUnit,
    /// Upstream nutrient id of the row, when it carried one
    pub source_id: Option<u32>,
    /// Structured row or label block
    pub source: MatchSource,
}

/// Outcome of a resolution call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientResolution {
    /// Identifier the caller asked for
    pub requested_id: u64,
    /// Record from the last successful attempt
    pub record: FoodRecord,
    /// Set when the record was substituted for a retired identifier
    pub provenance: Option<AliasProvenance>,
    /// Values found, by key
    pub matches: BTreeMap<NutrientKey, NutrientMatch>,
    /// Requested keys without a value
    pub missing: Vec<NutrientKey>,
    /// Query shapes fetched, including skipped ones
    pub attempts_used: usize,
}

impl NutrientResolution {
    /// Value for `key`, if matched
    #[must_use]
    pub fn value(&self, key: NutrientKey) -> Option<f64> {
        self.matches.get(&key).map(|m| m.value)
    }

    /// Whether every requested key was matched
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Ordered, de-duplicated query shapes for a set of keys
#[must_use]
pub fn plan_attempts(keys: &BTreeSet<NutrientKey>) -> Vec<FoodQuery> {
    let ids: BTreeSet<u32> = keys
        .iter()
        .flat_map(|key| key.definition().numeric_ids.iter().copied())
        .collect();

    let mut candidates = Vec::with_capacity(3);
    if !ids.is_empty() {
        candidates.push(FoodQuery::abridged().with_nutrients(ids));
    }
    candidates.push(FoodQuery::full());
    candidates.push(FoodQuery::abridged());

    let mut attempts: Vec<FoodQuery> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !attempts.contains(&candidate) {
            attempts.push(candidate);
        }
    }
    attempts
}

/// Scan one record for `pending` keys, recording the first match per key
pub fn scan_record(
    record: &FoodRecord,
    pending: &[NutrientKey],
    matches: &mut BTreeMap<NutrientKey, NutrientMatch>,
) {
    for row in record.food_nutrients() {
        if pending.iter().all(|key| matches.contains_key(key)) {
            return;
        }
        scan_row(row, pending, matches);
    }

    let Some(block) = record.label_nutrients() else {
        return;
    };
    let lookup = LabelLookup::new(block);
    for key in pending {
        if matches.contains_key(key) {
            continue;
        }
        if let Some(value) = lookup.value_for(*key) {
            matches.insert(
                *key,
                NutrientMatch {
                    value,
                    unit: key.definition().unit,
                    source_id: None,
                    source: MatchSource::LabelBlock,
                },
            );
        }
    }
}

fn scan_row(row: &Value, pending: &[NutrientKey], matches: &mut BTreeMap<NutrientKey, NutrientMatch>) {
    let Some(value) = row_value(row) else {
        return;
    };
    let ids = row_ids(row);
    let name = row_name(row);
    let unit = row_unit(row);

    for key in pending {
        if matches.contains_key(key) {
            continue;
        }
        let definition = key.definition();
        if unit.is_some_and(|u| !definition.unit.accepts(u)) {
            continue;
        }
        let id_hit = ids.iter().copied().find(|id| definition.has_id(*id));
        let name_hit = name.as_deref().is_some_and(|n| definition.has_name(n));
        if id_hit.is_some() || name_hit {
            matches.insert(
                *key,
                NutrientMatch {
                    value,
                    unit: definition.unit,
                    source_id: id_hit.or_else(|| ids.first().copied()),
                    source: MatchSource::NutrientList,
                },
            );
        }
    }
}

fn as_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Every nutrient identifier a row carries, across response formats
fn row_ids(row: &Value) -> Vec<u32> {
    let nested = row.get("nutrient");
    let mut fields = vec![
        nested.and_then(|n| n.get("id")),
        nested.and_then(|n| n.get("number")),
        row.get("nutrientId"),
        row.get("nutrient_id"),
        row.get("nutrientNumber"),
        row.get("number"),
    ];
    // With a nested nutrient object, the row's own `id` is a row key
    if nested.is_none() {
        fields.push(row.get("id"));
    }
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .flatten()
        .filter_map(as_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn row_name(row: &Value) -> Option<String> {
    row.get("nutrient")
        .and_then(|n| n.get("name"))
        .or_else(|| row.get("nutrientName"))
        .or_else(|| row.get("name"))
        .and_then(Value::as_str)
        .map(|name| name.trim().to_lowercase())
}

fn row_unit(row: &Value) -> Option<&str> {
    row.get("nutrient")
        .and_then(|n| n.get("unitName"))
        .or_else(|| row.get("unitName"))
        .or_else(|| row.get("unit_name"))
        .and_then(Value::as_str)
}

fn row_value(row: &Value) -> Option<f64> {
    ["amount", "value"]
        .iter()
        .filter_map(|field| row.get(*field))
        .find_map(numeric_value)
}

fn is_filter_rejection(error: &UpstreamError) -> bool {
    error
        .http_status()
        .is_some_and(|status| FILTER_REJECTION_STATUSES.contains(&status))
}

/// Resolves nutrient values for records through a shared [`UsdaClient`]
pub struct NutrientResolver {
    client: Arc<UsdaClient>,
    policy: Arc<dyn ResolutionPolicy>,
}

impl NutrientResolver {
    /// Resolver with the Foundation macro policy
    #[must_use]
    pub fn new(client: Arc<UsdaClient>) -> Self {
        Self {
            client,
            policy: Arc::new(FoundationMacroPolicy::default()),
        }
    }

    /// Replace the policy deciding which missing keys are fatal
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ResolutionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve `keys` for record `fdc_id`
    ///
    /// # Errors
    ///
    /// Returns an upstream error when no attempt could fetch the record, or
    /// [`ResolutionError::IncompleteCoreNutrients`] when the policy rejects
    /// what is still missing after every attempt
    pub async fn resolve(
        &self,
        fdc_id: u64,
        keys: &BTreeSet<NutrientKey>,
    ) -> Result<NutrientResolution, ResolutionError> {
        let wanted: Vec<NutrientKey> = keys.iter().copied().collect();
        let attempts = plan_attempts(keys);
        let mut matches = BTreeMap::new();
        let mut last_fetch = None;
        let mut last_error = None;
        let mut attempts_used = 0;

        for query in &attempts {
            attempts_used += 1;
            let fetched = match self.client.get_food_resolved(fdc_id, query).await {
                Ok(fetched) => fetched,
                Err(error) if query.is_filtered() && is_filter_rejection(&error) => {
                    warn!(
                        fdc_id,
                        status = ?error.http_status(),
                        filter_len = query.nutrient_ids.as_ref().map_or(0, BTreeSet::len),
                        "Upstream rejected nutrient filter, trying next query shape"
                    );
                    last_error = Some(error);
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            let pending: Vec<NutrientKey> = wanted
                .iter()
                .copied()
                .filter(|key| !matches.contains_key(key))
                .collect();
            scan_record(&fetched.record, &pending, &mut matches);
            debug!(
                fdc_id,
                attempt = attempts_used,
                format = query.format.as_str(),
                filtered = query.is_filtered(),
                matched = matches.len(),
                wanted = wanted.len(),
                "Nutrient resolution attempt complete"
            );
            last_fetch = Some(fetched);

            if wanted.iter().all(|key| matches.contains_key(key)) {
                break;
            }
        }

        let Some(fetched) = last_fetch else {
            return Err(last_error
                .unwrap_or_else(|| UpstreamError::not_found(format!("Food with FDC ID {fdc_id} not found")))
                .into());
        };

        let missing: Vec<NutrientKey> = wanted
            .into_iter()
            .filter(|key| !matches.contains_key(key))
            .collect();
        let fatal = self.policy.fatal_missing(&fetched.record, &missing);
        if !fatal.is_empty() {
            return Err(ResolutionError::IncompleteCoreNutrients {
                fdc_id: fetched.record.fdc_id().unwrap_or(fdc_id),
                data_type: fetched.record.data_type().unwrap_or_default().to_owned(),
                missing: fatal.iter().map(|key| key.as_str().to_owned()).collect(),
            });
        }

        Ok(NutrientResolution {
            requested_id: fdc_id,
            record: fetched.record,
            provenance: fetched.provenance,
            matches,
            missing,
            attempts_used,
        })
    }

    /// Resolve several records concurrently; every outcome is reported on its own
    pub async fn resolve_many(
        &self,
        fdc_ids: &[u64],
        keys: &BTreeSet<NutrientKey>,
    ) -> Vec<(u64, Result<NutrientResolution, ResolutionError>)> {
        join_all(
            fdc_ids
                .iter()
                .map(|&fdc_id| async move { (fdc_id, self.resolve(fdc_id, keys).await) }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_starts_with_filtered_abridged() {
        let keys = BTreeSet::from([NutrientKey::Protein, NutrientKey::Calories]);
        let attempts = plan_attempts(&keys);
        assert_eq!(attempts.len(), 3);
        let ids = attempts[0].nutrient_ids.clone().unwrap_or_default();
        assert!(ids.contains(&208) && ids.contains(&1003));
        assert!(ids.iter().zip(ids.iter().skip(1)).all(|(a, b)| a < b));
        assert_eq!(attempts[1], FoodQuery::full());
        assert_eq!(attempts[2], FoodQuery::abridged());
    }

    #[test]
    fn test_plan_without_keys_skips_filter() {
        let attempts = plan_attempts(&BTreeSet::new());
        assert_eq!(attempts, vec![FoodQuery::full(), FoodQuery::abridged()]);
    }

    #[test]
    fn test_row_id_shapes() {
        assert_eq!(row_ids(&json!({"nutrient": {"id": 1008, "number": "208"}, "id": 99})), vec![1008, 208]);
        assert_eq!(row_ids(&json!({"nutrientId": 1003, "nutrientNumber": "203"})), vec![1003, 203]);
        assert_eq!(row_ids(&json!({"number": "204", "name": "Total lipid (fat)"})), vec![204]);
    }

    #[test]
    fn test_first_row_wins() {
        let record = FoodRecord::new(json!({
            "foodNutrients": [
                {"number": "203", "amount": 3.1, "unitName": "G"},
                {"nutrientId": 1003, "value": 9.9, "unitName": "G"}
            ]
        }));
        let mut matches = BTreeMap::new();
        scan_record(&record, &[NutrientKey::Protein], &mut matches);
        assert_eq!(matches.get(&NutrientKey::Protein).map(|m| m.value), Some(3.1));
    }

    #[test]
    fn test_name_match_respects_unit() {
        let record = FoodRecord::new(json!({
            "foodNutrients": [
                {"name": "Energy", "amount": 1000, "unitName": "kJ"},
                {"name": "Energy", "amount": 239, "unitName": "KCAL"}
            ]
        }));
        let mut matches = BTreeMap::new();
        scan_record(&record, &[NutrientKey::Calories], &mut matches);
        let calories = matches.get(&NutrientKey::Calories);
        assert_eq!(calories.map(|m| m.value), Some(239.0));
        assert_eq!(calories.map(|m| m.source), Some(MatchSource::NutrientList));
    }

    #[test]
    fn test_label_block_fills_gaps() {
        let record = FoodRecord::new(json!({
            "foodNutrients": [{"number": "203", "amount": 5, "unitName": "G"}],
            "labelNutrients": {"fat": {"value": 2}, "protein": {"value": 40}}
        }));
        let mut matches = BTreeMap::new();
        scan_record(&record, &[NutrientKey::Protein, NutrientKey::Fat], &mut matches);
        assert_eq!(matches.get(&NutrientKey::Protein).map(|m| m.value), Some(5.0));
        assert_eq!(matches.get(&NutrientKey::Fat).map(|m| m.source), Some(MatchSource::LabelBlock));
    }
}
