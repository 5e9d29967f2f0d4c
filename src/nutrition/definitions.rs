// ABOUTME: Static nutrient definitions keyed by NutrientKey
// ABOUTME: Upstream numeric ids across numbering schemes, name aliases, units and label candidates
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Nutrient definitions
//!
//! `FoodData` Central identifies a nutrient two ways: the current `nutrient.id`
//! (e.g. 1008 for energy) and the legacy SR "nutrient number" (e.g. 208).
//! Both appear in responses depending on format and dataset, so each
//! definition carries every id it may be reported under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A nutrient callers can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientKey {
    /// Energy in kilocalories
    Calories,
    /// Protein
    Protein,
    /// Total fat
    Fat,
    /// Carbohydrate by difference
    Carbs,
    /// Saturated fatty acids
    SaturatedFat,
    /// Total dietary fiber
    Fiber,
    /// Total sugars
    Sugars,
    /// Sodium
    Sodium,
    /// Cholesterol
    Cholesterol,
    /// Calcium
    Calcium,
    /// Iron
    Iron,
    /// Potassium
    Potassium,
    /// Vitamin A (retinol activity equivalents)
    VitaminA,
    /// Vitamin C
    VitaminC,
    /// Vitamin D (D2 + D3)
    VitaminD,
}

impl NutrientKey {
    /// Every key, in definition order
    pub const ALL: [Self; 15] = [
        Self::Calories,
        Self::Protein,
        Self::Fat,
        Self::Carbs,
        Self::SaturatedFat,
        Self::Fiber,
        Self::Sugars,
        Self::Sodium,
        Self::Cholesterol,
        Self::Calcium,
        Self::Iron,
        Self::Potassium,
        Self::VitaminA,
        Self::VitaminC,
        Self::VitaminD,
    ];

    /// The four macro keys
    pub const CORE_MACROS: [Self; 4] = [Self::Calories, Self::Protein, Self::Fat, Self::Carbs];

    /// Canonical `snake_case` name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calories => "calories",
            Self::Protein => "protein",
            Self::Fat => "fat",
            Self::Carbs => "carbs",
            Self::SaturatedFat => "saturated_fat",
            Self::Fiber => "fiber",
            Self::Sugars => "sugars",
            Self::Sodium => "sodium",
            Self::Cholesterol => "cholesterol",
            Self::Calcium => "calcium",
            Self::Iron => "iron",
            Self::Potassium => "potassium",
            Self::VitaminA => "vitamin_a",
            Self::VitaminC => "vitamin_c",
            Self::VitaminD => "vitamin_d",
        }
    }

    /// Whether this key is calories, protein, fat or carbs
    #[must_use]
    pub const fn is_core_macro(self) -> bool {
        matches!(
            self,
            Self::Calories | Self::Protein | Self::Fat | Self::Carbs
        )
    }

    /// Static definition for this key
    #[must_use]
    pub fn definition(self) -> &'static NutrientDefinition {
        &DEFINITIONS[self as usize]
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a nutrient name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown nutrient '{0}'")]
pub struct UnknownNutrient(pub String);

impl FromStr for NutrientKey {
    type Err = UnknownNutrient;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let key = match normalized.as_str() {
            "calories" | "kcal" | "energy" => Self::Calories,
            "protein" => Self::Protein,
            "fat" | "total_fat" => Self::Fat,
            "carbs" | "carbohydrates" | "carbohydrate" => Self::Carbs,
            "saturated_fat" | "sat_fat" => Self::SaturatedFat,
            "fiber" | "fibre" | "dietary_fiber" => Self::Fiber,
            "sugars" | "sugar" => Self::Sugars,
            "sodium" => Self::Sodium,
            "cholesterol" => Self::Cholesterol,
            "calcium" => Self::Calcium,
            "iron" => Self::Iron,
            "potassium" => Self::Potassium,
            "vitamin_a" => Self::VitaminA,
            "vitamin_c" => Self::VitaminC,
            "vitamin_d" => Self::VitaminD,
            _ => return Err(UnknownNutrient(s.to_owned())),
        };
        Ok(key)
    }
}

/// Unit a nutrient value is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientUnit {
    /// Grams
    G,
    /// Kilocalories
    Kcal,
    /// Milligrams
    Mg,
    /// Micrograms
    Mcg,
}

impl NutrientUnit {
    /// Display form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Kcal => "kcal",
            Self::Mg => "mg",
            Self::Mcg => "mcg",
        }
    }

    /// Whether an upstream `unitName` is compatible with this unit.
    ///
    /// Entries sharing a name alias can differ in unit (energy in kJ,
    /// vitamin A in IU); those must not be taken as a match.
    #[must_use]
    pub fn accepts(self, upstream_unit: &str) -> bool {
        let unit = upstream_unit.trim().to_lowercase();
        match self {
            Self::G => unit == "g",
            Self::Kcal => unit == "kcal",
            Self::Mg => unit == "mg",
            Self::Mcg => matches!(unit.as_str(), "mcg" | "ug" | "µg" | "μg"),
        }
    }
}

/// How a nutrient is identified in upstream responses
#[derive(Debug)]
pub struct NutrientDefinition {
    /// Key this definition belongs to
    pub key: NutrientKey,
    /// Human-readable label
    pub label: &'static str,
    /// Canonical unit
    pub unit: NutrientUnit,
    /// Upstream ids, current and legacy numbering
    pub numeric_ids: &'static [u32],
    /// Lower-cased upstream nutrient names
    pub name_aliases: &'static [&'static str],
    /// Field names tried against a record's label block, in preference order
    pub label_candidates: &'static [&'static str],
}

impl NutrientDefinition {
    /// Whether `id` is one of this nutrient's upstream ids
    #[must_use]
    pub fn has_id(&self, id: u32) -> bool {
        self.numeric_ids.contains(&id)
    }

    /// Whether a lower-cased, trimmed upstream name refers to this nutrient
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name_aliases.iter().any(|alias| *alias == name)
    }
}

static DEFINITIONS: [NutrientDefinition; 15] = [
    NutrientDefinition {
        key: NutrientKey::Calories,
        label: "Calories",
        unit: NutrientUnit::Kcal,
        numeric_ids: &[1008, 2047, 2048, 208, 957, 958],
        name_aliases: &[
            "energy",
            "calories",
            "energy (atwater general factors)",
            "energy (atwater specific factors)",
        ],
        label_candidates: &["calories", "energy", "kcal", "Energy (kcal)", "caloriesKcal"],
    },
    NutrientDefinition {
        key: NutrientKey::Protein,
        label: "Protein",
        unit: NutrientUnit::G,
        numeric_ids: &[1003, 203],
        name_aliases: &["protein"],
        label_candidates: &["protein", "totalProtein", "Protein (g)"],
    },
    NutrientDefinition {
        key: NutrientKey::Fat,
        label: "Total fat",
        unit: NutrientUnit::G,
        numeric_ids: &[1004, 204, 1085, 298],
        name_aliases: &["total lipid (fat)", "total fat", "fat", "total fat (nlea)"],
        label_candidates: &[
            "fat",
            "totalFat",
            "total_fat",
            "Total fat (NLEA)",
            "Total lipid (fat)",
            "lipids",
        ],
    },
    NutrientDefinition {
        key: NutrientKey::Carbs,
        label: "Carbohydrates",
        unit: NutrientUnit::G,
        numeric_ids: &[1005, 205, 1050],
        name_aliases: &[
            "carbohydrate, by difference",
            "carbohydrate, by summation",
            "carbohydrates",
            "carbohydrate",
            "total carbohydrate",
        ],
        label_candidates: &[
            "carbohydrates",
            "carbs",
            "totalCarbohydrate",
            "totalCarbohydrates",
            "total_carbohydrate",
            "Carbohydrate, by difference",
        ],
    },
    NutrientDefinition {
        key: NutrientKey::SaturatedFat,
        label: "Saturated fat",
        unit: NutrientUnit::G,
        numeric_ids: &[1258, 606],
        name_aliases: &["fatty acids, total saturated", "saturated fat"],
        label_candidates: &["saturatedFat", "saturated_fat", "satFat", "Fatty acids, total saturated"],
    },
    NutrientDefinition {
        key: NutrientKey::Fiber,
        label: "Dietary fiber",
        unit: NutrientUnit::G,
        numeric_ids: &[1079, 291],
        name_aliases: &["fiber, total dietary", "dietary fiber", "fiber"],
        label_candidates: &["fiber", "dietaryFiber", "dietary_fiber", "Fiber, total dietary"],
    },
    NutrientDefinition {
        key: NutrientKey::Sugars,
        label: "Sugars",
        unit: NutrientUnit::G,
        numeric_ids: &[2000, 269, 1063],
        name_aliases: &[
            "sugars, total including nlea",
            "sugars, total",
            "total sugars",
            "sugars",
        ],
        label_candidates: &["sugars", "totalSugars", "total_sugars", "Sugars, total including NLEA"],
    },
    NutrientDefinition {
        key: NutrientKey::Sodium,
        label: "Sodium",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1093, 307],
        name_aliases: &["sodium, na", "sodium"],
        label_candidates: &["sodium", "Sodium, Na"],
    },
    NutrientDefinition {
        key: NutrientKey::Cholesterol,
        label: "Cholesterol",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1253, 601],
        name_aliases: &["cholesterol"],
        label_candidates: &["cholesterol"],
    },
    NutrientDefinition {
        key: NutrientKey::Calcium,
        label: "Calcium",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1087, 301],
        name_aliases: &["calcium, ca", "calcium"],
        label_candidates: &["calcium", "Calcium, Ca"],
    },
    NutrientDefinition {
        key: NutrientKey::Iron,
        label: "Iron",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1089, 303],
        name_aliases: &["iron, fe", "iron"],
        label_candidates: &["iron", "Iron, Fe"],
    },
    NutrientDefinition {
        key: NutrientKey::Potassium,
        label: "Potassium",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1092, 306],
        name_aliases: &["potassium, k", "potassium"],
        label_candidates: &["potassium", "Potassium, K"],
    },
    NutrientDefinition {
        key: NutrientKey::VitaminA,
        label: "Vitamin A",
        unit: NutrientUnit::Mcg,
        numeric_ids: &[1106, 320],
        name_aliases: &["vitamin a, rae", "vitamin a"],
        label_candidates: &["vitaminA", "vitamin_a", "Vitamin A, RAE"],
    },
    NutrientDefinition {
        key: NutrientKey::VitaminC,
        label: "Vitamin C",
        unit: NutrientUnit::Mg,
        numeric_ids: &[1162, 401],
        name_aliases: &["vitamin c, total ascorbic acid", "vitamin c"],
        label_candidates: &["vitaminC", "vitamin_c", "Vitamin C, total ascorbic acid"],
    },
    NutrientDefinition {
        key: NutrientKey::VitaminD,
        label: "Vitamin D",
        unit: NutrientUnit::Mcg,
        numeric_ids: &[1114, 328],
        name_aliases: &["vitamin d (d2 + d3)", "vitamin d"],
        label_candidates: &["vitaminD", "vitamin_d", "Vitamin D (D2 + D3)"],
    },
];
