// ABOUTME: Static substitution table for record identifiers the upstream has retired
// ABOUTME: Consulted only after a not-found failure; provenance travels with the substituted record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A retired identifier and the record that replaces it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Identifier callers still ask for
    pub requested_id: u64,
    /// Identifier to fetch instead
    pub replacement_id: u64,
    /// Dataset of the replacement record
    pub dataset: Option<String>,
    /// Why the substitution is acceptable
    pub rationale: Option<String>,
}

impl AliasEntry {
    /// Create an entry without annotations
    #[must_use]
    pub const fn new(requested_id: u64, replacement_id: u64) -> Self {
        Self {
            requested_id,
            replacement_id,
            dataset: None,
            rationale: None,
        }
    }

    /// Annotate with the replacement's dataset
    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Annotate with a rationale
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Provenance record for a substitution made through this entry
    #[must_use]
    pub fn provenance(&self) -> AliasProvenance {
        AliasProvenance {
            requested_id: self.requested_id,
            replacement_id: self.replacement_id,
            dataset: self.dataset.clone(),
            rationale: self.rationale.clone(),
        }
    }
}

/// Explains that a returned record stands in for a different requested id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasProvenance {
    /// Identifier the caller asked for
    pub requested_id: u64,
    /// Identifier actually returned
    pub replacement_id: u64,
    /// Dataset of the replacement record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Why the substitution is acceptable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Read-only lookup keyed by requested identifier
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<u64, AliasEntry>,
}

static BUILTIN: OnceLock<AliasTable> = OnceLock::new();

impl AliasTable {
    /// Build a table; a later entry for the same requested id wins
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = AliasEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.requested_id, entry))
                .collect(),
        }
    }

    /// Table with no substitutions
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Substitutions shipped with the gateway
    #[must_use]
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            Self::new([
                AliasEntry::new(1_750_340, 171_688)
                    .with_dataset("SR Legacy")
                    .with_rationale(
                        "Foundation apple sample is no longer served; SR Legacy raw apple with skin covers the same food",
                    ),
                AliasEntry::new(2_346_404, 171_477)
                    .with_dataset("SR Legacy")
                    .with_rationale(
                        "Retired chicken breast sample; SR Legacy roasted breast meat is the maintained equivalent",
                    ),
            ])
        })
    }

    /// Look up the replacement for a retired identifier
    #[must_use]
    pub fn resolve(&self, requested_id: u64) -> Option<&AliasEntry> {
        self.entries.get(&requested_id)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
