//! Offline variable substitution (§4.6): a single topological pass that
//! collapses nodes whose inclusion relationship is provably equal to their
//! unique predecessor's, before the worklist ever runs.
//!
//! # References
//! - Rountev, A. & Chandra, S. "Off-line variable substitution for scaling
//!   points-to analysis", PLDI 2000 (Theorem 4: a direct node whose
//!   predecessors all have identical solutions must itself have that
//!   solution).

use tracing::debug;

use crate::domain::var_info::{VarId, VarTable};
use crate::infrastructure::graph::ConstraintGraph;
use crate::infrastructure::solver::{topo_order, unify};
use crate::infrastructure::union_find::UnionFind;
use crate::stats::AnalysisStats;

/// Run the pass once over a reverse-topological order of the current
/// graph. Returns the number of nodes folded (for stats).
pub fn run(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    stats: &mut Option<AnalysisStats>,
) -> usize {
    let mut order = topo_order(graph, uf);
    order.reverse();
    let mut folded = 0;

    for i in order {
        let i = uf.find(i);
        if table.get(i).address_taken || table.get(i).indirect_target {
            continue;
        }
        let Some(w) = eligible_predecessor(table, graph, uf, i) else {
            continue;
        };
        if w == i {
            continue;
        }
        debug!(node = i, into = w, "offline variable substitution fold");
        uf.union_into(i, w);
        unify(table, graph, i, w, &mut None);
        if let Some(s) = stats {
            s.record_static_unify();
        }
        folded += 1;
    }
    folded
}

/// A node `i` is eligible for substitution iff all its predecessor edges
/// (a) carry only the zero-weight bit, (b) come from the same
/// representative `w`, and (c) `solution(i) ⊆ solution(w)`.
fn eligible_predecessor(
    table: &VarTable,
    graph: &ConstraintGraph,
    uf: &mut UnionFind,
    i: VarId,
) -> Option<VarId> {
    let mut candidate: Option<VarId> = None;
    let mut any_pred = false;

    let preds: Vec<(VarId, bool, bool)> = graph
        .predecessors(i)
        .map(|e| {
            let only_zero = e.weights.iter().all(|w| w == 0) && e.weights.contains(0);
            (e.src, only_zero, e.weights.contains(0))
        })
        .collect();

    for (src, only_zero_weight, has_zero) in preds {
        any_pred = true;
        if !only_zero_weight || !has_zero {
            return None;
        }
        let rep = uf.find(src);
        match candidate {
            None => candidate = Some(rep),
            Some(w) if w == rep => {}
            Some(_) => return None,
        }
    }

    if !any_pred {
        return None;
    }
    let w = candidate?;
    if !table.get(i).solution.is_subset_of(&table.get(w).solution) {
        return None;
    }
    Some(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::var_info::VarTable;

    fn fresh(n: usize) -> (VarTable, ConstraintGraph, UnionFind) {
        let mut table = VarTable::with_special_vars();
        for i in 0..n {
            table.new_variable(Some(i as u64), format!("v{i}"), Some(64), true, &[]);
        }
        let total = table.len();
        (table, ConstraintGraph::new(), UnionFind::new(total))
    }

    #[test]
    fn direct_node_with_single_predecessor_folds() {
        let (mut table, mut graph, mut uf) = fresh(2);
        // w -> i (zero weight); solution(i) starts as a subset (empty) of
        // solution(w).
        table.get_mut(4).solution.insert(0);
        graph.add_edge(4, 5, 0);
        let mut stats = None;
        run(&mut table, &mut graph, &mut uf, &mut stats);
        assert_eq!(uf.find(5), uf.find(4));
    }

    #[test]
    fn node_with_two_distinct_predecessors_does_not_fold() {
        let (mut table, mut graph, mut uf) = fresh(3);
        graph.add_edge(4, 6, 0);
        graph.add_edge(5, 6, 0);
        let mut stats = None;
        run(&mut table, &mut graph, &mut uf, &mut stats);
        assert_eq!(uf.find(6), 6);
    }

    #[test]
    fn address_taken_node_is_never_folded() {
        let (mut table, mut graph, mut uf) = fresh(2);
        table.get_mut(5).address_taken = true;
        graph.add_edge(4, 5, 0);
        let mut stats = None;
        run(&mut table, &mut graph, &mut uf, &mut stats);
        assert_eq!(uf.find(5), 5);
    }
}
