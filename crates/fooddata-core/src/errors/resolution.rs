// ABOUTME: Errors produced by nutrient resolution
// ABOUTME: Wraps upstream failures and reports policy-mandated incomplete records

use super::upstream::UpstreamError;

/// Nutrient resolution failed
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolutionError {
    /// Fetching the record failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The record lacks nutrients the active policy treats as mandatory
    #[error(
        "Food {fdc_id} ({data_type}) is missing required nutrients after all query shapes: {}. Choose a different record or compute these values manually.",
        .missing.join(", ")
    )]
    IncompleteCoreNutrients {
        /// Record that was resolved
        fdc_id: u64,
        /// Upstream dataset classification of the record
        data_type: String,
        /// Missing nutrient keys
        missing: Vec<String>,
    },
}
