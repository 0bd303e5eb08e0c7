//! Solver statistics, collected when [`crate::config::AnalysisConfig::emit_stats`]
//! is set. Purely observational; never consulted by the solver itself.

use serde::{Deserialize, Serialize};

/// Totals accumulated over one `solve()` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Variables created via `new_variable`/`new_artificial`, including
    /// field-sensitive decomposition.
    pub vars_created: u64,

    /// Nodes folded into a representative during offline variable
    /// substitution (§4.6), before the worklist ever runs.
    pub unified_statically: u64,

    /// Nodes folded into a representative during worklist-time cycle
    /// detection (§4.4/§4.5).
    pub unified_dynamically: u64,

    /// Worklist passes executed by `solve()`.
    pub iterations: u64,

    /// Graph edges added over the lifetime of the solve (initial build plus
    /// edges added while processing complex constraints).
    pub edges_added: u64,
}

impl AnalysisStats {
    pub(crate) fn record_vars_created(&mut self, n: u64) {
        self.vars_created += n;
    }

    pub(crate) fn record_static_unify(&mut self) {
        self.unified_statically += 1;
    }

    pub(crate) fn record_dynamic_unify(&mut self) {
        self.unified_dynamically += 1;
    }

    pub(crate) fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    pub(crate) fn record_edge_added(&mut self) {
        self.edges_added += 1;
    }
}
