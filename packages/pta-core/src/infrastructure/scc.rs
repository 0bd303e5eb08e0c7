//! Cycle detection: Nuutila-variant Tarjan SCC over zero-weight edges (§4.4).
//!
//! Distinct from classical lowlink-based Tarjan: instead of tracking a
//! separate `lowlink` array, this variant compares `visited_index` values
//! through the union-find representative chase itself, which is also how
//! the resulting components get folded (§9, §4.4-§4.5).
//!
//! Only zero-weight successor edges are traversed. Non-zero weights encode
//! real field displacement and must never collapse nodes.
//!
//! # References
//! - Nuutila, E. & Soisalon-Soininen, E. "On finding the strongly connected
//!   components in a directed graph", Information Processing Letters 49(1), 1994.

use crate::domain::var_info::VarId;
use crate::infrastructure::graph::ConstraintGraph;
use crate::infrastructure::union_find::UnionFind;

/// Per-run state for the Nuutila DFS.
struct SccState {
    visited: Vec<bool>,
    in_component: Vec<bool>,
    visited_index: Vec<u32>,
    current_index: u32,
    scc_stack: Vec<VarId>,
    /// Flat sequence of ids grouped contiguously by component representative
    /// (§4.4). Consumed by [`crate::infrastructure::solver`]'s unification
    /// step.
    unification_queue: Vec<VarId>,
}

/// Run Nuutila-variant Tarjan over every not-yet-visited representative,
/// folding each discovered SCC into a single representative via `uf`.
///
/// `uf` is mutated in place: every id in a discovered cycle becomes a
/// non-representative pointing at the cycle's chosen representative. The
/// returned queue is grouped by representative in discovery order; callers
/// perform the accompanying solution/edge/complex-constraint merges (not
/// done here — this module only decides *which* ids collapse together, per
/// the separation of concerns in §9).
pub fn detect_and_collapse(graph: &ConstraintGraph, uf: &mut UnionFind) -> Vec<VarId> {
    let n = graph.num_nodes();
    let mut state = SccState {
        visited: vec![false; n],
        in_component: vec![false; n],
        visited_index: vec![0; n],
        current_index: 0,
        scc_stack: Vec::new(),
        unification_queue: Vec::new(),
    };

    for n in 0..n as VarId {
        if uf.is_representative(n) && !state.visited[n as usize] {
            scc_visit(graph, uf, &mut state, n);
        }
    }

    state.unification_queue
}

fn scc_visit(graph: &ConstraintGraph, uf: &mut UnionFind, state: &mut SccState, n: VarId) {
    debug_assert!(uf.is_representative(n));
    state.visited[n as usize] = true;
    state.in_component[n as usize] = false;
    state.visited_index[n as usize] = state.current_index;
    state.current_index += 1;

    // Collect successors first: `graph` only knows about edges as created,
    // and representatives can shift mid-recursion as deeper calls fold
    // cycles, so we re-resolve `node(n)` defensively at each step.
    let succs: Vec<(VarId, bool)> = graph
        .successors(n)
        .map(|e| (e.dest, e.weights.contains(0)))
        .collect();

    for (w, is_zero_weight) in succs {
        if !is_zero_weight {
            continue;
        }
        let w = uf.find_readonly(w);
        if !state.visited[w as usize] {
            scc_visit(graph, uf, state, w);
        }
        if !state.in_component[w as usize] {
            let t = uf.find(w);
            let nnode = uf.find(n);
            if state.visited_index[t as usize] < state.visited_index[nnode as usize] {
                uf.union_into(nnode, t);
            }
        }
    }

    if uf.find(n) == n {
        let t = state.visited_index[n as usize];
        state.in_component[n as usize] = true;
        while let Some(&top) = state.scc_stack.last() {
            if state.visited_index[top as usize] < t {
                break;
            }
            let w = state.scc_stack.pop().unwrap();
            uf.union_into(w, n);
            state.in_component[w as usize] = true;
            state.unification_queue.push(w);
        }
    } else {
        state.scc_stack.push(n);
    }
}
