//! Ports: a narrow trait surface for the outbound query operations (§6),
//! so downstream consumers can depend on an abstraction rather than the
//! concrete [`crate::application::PointsToAnalysis`] type.
//!
//! The lineage this is drawn from exposes a multi-backend factory
//! (`PTAFactory`/`AnalyzerKind` selecting among Steensgaard/Andersen/hybrid
//! implementations behind `dyn PTAAnalyzer`). This core implements exactly
//! one algorithm (§1 PURPOSE & SCOPE), so that dispatch layer has no
//! counterpart here — dropped rather than kept as dead indirection.

use crate::domain::var_info::VarId;
use crate::query::PointsToResult;

/// Read-only access to a solved analysis.
pub trait PointsToQuery {
    /// `points_to(pointer) → result`, tri-state per §4.9.
    fn points_to(&self, id: VarId) -> PointsToResult;

    /// Visit a variable's solution members (raw ids) in ascending order.
    fn for_each_in_solution(&self, id: VarId, cb: impl FnMut(VarId));
}

impl PointsToQuery for crate::application::PointsToAnalysis {
    fn points_to(&self, id: VarId) -> PointsToResult {
        crate::application::PointsToAnalysis::points_to(self, id)
    }

    fn for_each_in_solution(&self, id: VarId, cb: impl FnMut(VarId)) {
        crate::application::PointsToAnalysis::for_each_in_solution(self, id, cb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PointsToAnalysis;
    use crate::config::AnalysisConfig;

    #[test]
    fn facade_implements_the_query_port() {
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        a.solve();
        assert_eq!(
            PointsToQuery::points_to(&a, 0),
            PointsToResult::KnownSet(vec![])
        );
    }
}
