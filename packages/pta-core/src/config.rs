//! Analysis configuration.
//!
//! Deliberately small: the solver recognizes exactly two options. A richer
//! layered preset/override system (as used elsewhere in this lineage for
//! whole-pipeline configuration) isn't warranted for two booleans.

use serde::{Deserialize, Serialize};

/// Options recognized by [`crate::application::PointsToAnalysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// When true (the default), aggregate declarations are decomposed into
    /// per-field variables and the analysis tracks which field a pointer
    /// targets. When false, every declaration folds to a single id.
    pub field_sensitive: bool,

    /// When true, the analyzer accumulates [`crate::stats::AnalysisStats`]
    /// during `solve()`. Has no effect on the computed solutions.
    pub emit_stats: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            field_sensitive: true,
            emit_stats: false,
        }
    }
}
