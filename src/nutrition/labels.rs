// ABOUTME: Free-form label block fallback for nutrient values missing from the structured list
// ABOUTME: Tolerates field naming drift by indexing keys raw, lower-cased and alphanumeric-only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::definitions::NutrientKey;

/// Lower-case and drop everything that is not a letter or digit
#[must_use]
pub fn compact_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Coerce a label value into a number.
///
/// Accepts a JSON number, a numeric string (optionally followed by a unit,
/// as in `"14 g"`), or an object carrying `value` or `amount`.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("amount"))
            .and_then(numeric_value),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn parse_leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return Some(n);
    }
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed.get(..end)?.parse().ok()
}

/// Index over a record's label block
#[derive(Debug)]
pub struct LabelLookup<'a> {
    entries: HashMap<String, &'a Value>,
}

impl<'a> LabelLookup<'a> {
    /// Index every field three ways; the first field to claim a form keeps it
    #[must_use]
    pub fn new(block: &'a Map<String, Value>) -> Self {
        let mut entries = HashMap::with_capacity(block.len() * 3);
        for (name, value) in block {
            entries.entry(name.clone()).or_insert(value);
            entries.entry(name.to_lowercase()).or_insert(value);
            entries.entry(compact_name(name)).or_insert(value);
        }
        Self { entries }
    }

    /// Numeric value for `candidate`, trying its raw, lower-cased and compact forms
    #[must_use]
    pub fn find(&self, candidate: &str) -> Option<f64> {
        [
            candidate.to_owned(),
            candidate.to_lowercase(),
            compact_name(candidate),
        ]
        .iter()
        .filter_map(|form| self.entries.get(form))
        .find_map(|value| numeric_value(value))
    }

    /// First label candidate of `key` that carries a numeric value
    #[must_use]
    pub fn value_for(&self, key: NutrientKey) -> Option<f64> {
        key.definition()
            .label_candidates
            .iter()
            .find_map(|candidate| self.find(candidate))
    }
}
