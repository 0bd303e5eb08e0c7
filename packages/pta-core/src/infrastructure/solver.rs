//! Andersen-style inclusion-based points-to solver: initial graph build
//! (§4.3), unification (§4.5), complex-constraint processing (§4.7), and
//! the iterative worklist loop (§4.8).
//!
//! # References
//! - Andersen, L. O. "Program Analysis and Specialization for the C
//!   Programming Language" (PhD thesis, 1994)
//! - Pearce, Kelly & Hankin, "Online Cycle Detection and Difference
//!   Propagation for Pointer Analysis" (2004)

use tracing::{debug, trace, warn};

use crate::domain::constraint::{merge_sorted, Constraint, ConstraintExpr};
use crate::domain::var_info::{VarId, VarTable};
use crate::infrastructure::bitset::DenseBitset;
use crate::infrastructure::graph::ConstraintGraph;
use crate::infrastructure::scc;
use crate::infrastructure::union_find::UnionFind;
use crate::stats::AnalysisStats;

/// Dense "changed" bitset plus live count, driving the worklist (§4.8).
#[derive(Debug, Clone)]
pub struct ChangedSet {
    bits: Vec<bool>,
    count: usize,
}

impl ChangedSet {
    pub fn all_set(n: usize) -> Self {
        ChangedSet {
            bits: vec![true; n],
            count: n,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_set(&self, id: VarId) -> bool {
        self.bits[id as usize]
    }

    pub fn set(&mut self, id: VarId) {
        if !self.bits[id as usize] {
            self.bits[id as usize] = true;
            self.count += 1;
        }
    }

    pub fn clear(&mut self, id: VarId) {
        if self.bits[id as usize] {
            self.bits[id as usize] = false;
            self.count -= 1;
        }
    }
}

/// `shift(S, k)` (§4.7): displace a solution set by field offset `k`,
/// mapping each member to the first field of its containing aggregate that
/// covers the new offset. Members that would fall outside their aggregate
/// (or belong to an artificial/unknown-size variable) pass through
/// unchanged rather than being dropped — unlike the untypesafe-offset drop
/// in complex-constraint processing, `shift` never loses a member.
pub fn shift(table: &VarTable, set: &DenseBitset, k: u64) -> DenseBitset {
    let mut out = DenseBitset::new();
    out.union_mapped(set, |i| {
        let vi = table.get(i);
        if vi.fullsize == crate::domain::var_info::UNKNOWN_SIZE || vi.offset + k >= vi.fullsize {
            i
        } else {
            table.first_vi_for_offset(i, vi.offset + k)
        }
    });
    out
}

/// Build the initial constraint graph from the front end's append-only
/// constraint list (§4.3). Consumes `constraints` (they've been fully
/// absorbed into direct solutions, complex lists, or graph edges).
pub fn build_graph(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    constraints: Vec<Constraint>,
    stats: &mut Option<AnalysisStats>,
) {
    use crate::domain::special::ANYTHING;

    for c in constraints {
        match (c.lhs, c.rhs) {
            (ConstraintExpr::Scalar { var: x, .. }, ConstraintExpr::AddrOf { var: y, .. }) => {
                // x := &y
                table.get_mut(x).solution.insert(y);
            }
            (ConstraintExpr::Deref { var: x, .. }, ConstraintExpr::Scalar { .. })
            | (ConstraintExpr::Deref { var: x, .. }, ConstraintExpr::AddrOf { .. }) => {
                // *x := y  or  *x := &y
                insert_complex(table, x, c);
            }
            (ConstraintExpr::Scalar { .. }, ConstraintExpr::Deref { var: y, .. }) => {
                // x := *y
                insert_complex(table, y, c);
            }
            (ConstraintExpr::Scalar { var: x, off }, ConstraintExpr::Scalar { var: y, .. }) => {
                // x := y, plain copy: solution(y) flows into solution(x), so
                // the edge runs y -> x (worklist_pass propagates a node's
                // solution along its own successor edges). Edges are only
                // created between representatives; at build time every id
                // is its own rep. Neither side may be a placeholder id
                // (NULL/ANYTHING), and the trivial self-zero edge (x := x
                // at offset 0) is skipped.
                let is_trivial_self_edge = x == y && off == 0;
                if x > ANYTHING && y > ANYTHING && !is_trivial_self_edge && graph.add_edge(y, x, off) {
                    graph_added_edge(stats);
                }
            }
            _ => {
                // ANYTHING := ANYTHING and similar degenerate forms are
                // discarded by canonicalization before reaching here (§4.2
                // rule 1); defensively ignore anything else that slips
                // through rather than panic on a build-time edge case.
            }
        }
    }
    debug!("initial constraint graph built");
}

fn graph_added_edge(stats: &mut Option<AnalysisStats>) {
    if let Some(s) = stats {
        s.record_edge_added();
    }
}

fn insert_complex(table: &mut VarTable, owner: VarId, c: Constraint) {
    let list = &mut table.get_mut(owner).complex;
    let pos = list.binary_search(&c).unwrap_or_else(|e| e);
    if list.get(pos) != Some(&c) {
        list.insert(pos, c);
    }
}

/// Atomically merge `tounify`'s solution, edges, and complex-constraint
/// list into `into` (§4.5: unification mechanics; also used, with
/// `update_changed = None`, by offline variable substitution §4.6).
///
/// `into` must already be `tounify`'s representative under `uf` (i.e. the
/// caller has already called `uf.union_into` or relied on
/// [`crate::infrastructure::scc::detect_and_collapse`] having done so).
pub fn unify(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    tounify: VarId,
    into: VarId,
    changed: &mut Option<&mut ChangedSet>,
) {
    if tounify == into {
        return;
    }
    debug!(from = tounify, to = into, "unifying nodes");

    let from_solution = std::mem::replace(&mut table.get_mut(tounify).solution, DenseBitset::new());
    let from_variables = std::mem::replace(&mut table.get_mut(tounify).variables, DenseBitset::new());
    let from_complex = std::mem::take(&mut table.get_mut(tounify).complex);

    table.get_mut(into).solution.union_with(&from_solution);
    table.get_mut(into).variables.union_with(&from_variables);

    let rewritten: Vec<Constraint> = from_complex
        .iter()
        .map(|c| c.rewritten(tounify, into))
        .collect();
    let mut merged = std::mem::take(&mut table.get_mut(into).complex);
    merge_sorted(&mut merged, &rewritten);
    table.get_mut(into).complex = merged;

    let taken = table.get(tounify).address_taken;
    let indirect = table.get(tounify).indirect_target;
    table.get_mut(into).address_taken |= taken;
    table.get_mut(into).indirect_target |= indirect;

    graph.redirect(tounify, into);
    graph.clear_self_zero_weight(into);

    if let Some(changed) = changed.as_deref_mut() {
        if changed.is_set(tounify) {
            changed.clear(tounify);
            changed.set(into);
        }
    }
}

/// Process one representative's complex constraints (§4.7), given its
/// current solution. Returns whether any new graph edge was added (feeds
/// the worklist's "rerun cycle detection" decision, §4.8/§9) and which
/// other nodes were newly marked changed.
pub fn process_complex(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    i: VarId,
    changed: &mut ChangedSet,
) -> bool {
    let delta = table.get(i).solution.clone();
    let constraints = table.get(i).complex.clone();
    let mut edge_added = false;

    for c in &constraints {
        match (c.lhs, c.rhs) {
            (ConstraintExpr::Deref { off: loff, .. }, ConstraintExpr::AddrOf { var: y, .. }) => {
                process_store_addr(table, uf, &delta, loff, y, changed);
            }
            (ConstraintExpr::Scalar { var: lhs, .. }, ConstraintExpr::Deref { off: roff, .. }) => {
                edge_added |= process_load(table, graph, uf, &delta, roff, lhs, changed);
            }
            (ConstraintExpr::Deref { off: loff, .. }, ConstraintExpr::Scalar { var: rhs, .. }) => {
                edge_added |= process_store(table, graph, uf, &delta, loff, rhs, changed);
            }
            _ => {}
        }
    }

    edge_added
}

/// `*x := &y`: for each `j` in `x`'s solution, add `y` to the points-to set
/// of the field of `j` that `loff` lands on.
fn process_store_addr(
    table: &mut VarTable,
    uf: &mut UnionFind,
    delta: &DenseBitset,
    loff: u64,
    y: VarId,
    changed: &mut ChangedSet,
) {
    for j in delta.iter() {
        let mut off = loff;
        if table.type_safe(j, &mut off) {
            let field_offset = table.get(j).offset + off;
            let v = table.first_vi_for_offset(j, field_offset);
            let t = uf.find(v);
            if table.get_mut(t).solution.insert(y) {
                changed.set(t);
            }
        } else {
            warn!(var = j, offset = loff, "untypesafe usage in store-of-address constraint");
        }
    }
}

/// `lhs := *y`: for each `j` in `y`'s solution, add a zero-weight edge
/// `t -> lhs` (so future growth of `t`'s solution keeps flowing into `lhs`)
/// and union `t`'s solution into `lhs`'s right away.
fn process_load(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    delta: &DenseBitset,
    roff: u64,
    lhs: VarId,
    changed: &mut ChangedSet,
) -> bool {
    let mut edge_added = false;
    for j in delta.iter() {
        let mut off = roff;
        if table.type_safe(j, &mut off) {
            let field_offset = table.get(j).offset + off;
            let v = table.first_vi_for_offset(j, field_offset);
            let t = uf.find(v);
            if graph.add_edge(t, lhs, 0) {
                edge_added = true;
            }
            let t_solution = table.get(t).solution.clone();
            if table.get_mut(lhs).solution.union_with(&t_solution) {
                changed.set(lhs);
            }
        } else {
            warn!(var = j, offset = roff, "untypesafe usage in load constraint");
        }
    }
    edge_added
}

/// `*x := rhs`: for each `j` in `x`'s solution, add a `loff`-weighted edge
/// `rhs -> t` (so future growth of `rhs`'s solution keeps flowing into `t`,
/// shifted by `loff`) and union `shift(solution(rhs), loff)` into `t`'s
/// solution right away.
///
/// Open question resolution (§11): if adding the edge causes `t == rhs`
/// (the edge's destination turns out to be the constraint's own source),
/// `solution(rhs)` is re-read by id before continuing, so a representative
/// change observed mid-loop is picked up. This affects only intra-iteration
/// propagation speed, never the fixed point.
fn process_store(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    delta: &DenseBitset,
    loff: u64,
    rhs: VarId,
    changed: &mut ChangedSet,
) -> bool {
    let mut edge_added = false;
    for j in delta.iter() {
        let mut off = loff;
        if table.type_safe(j, &mut off) {
            let field_offset = table.get(j).offset + off;
            let v = table.first_vi_for_offset(j, field_offset);
            let t = uf.find(v);
            if graph.add_edge(rhs, t, loff) {
                edge_added = true;
            }
            // Re-fetch by id every time: if t == rhs this also re-reads the
            // set we're about to shift-union from, after any earlier
            // mutation in this same loop.
            let rhs_solution = table.get(rhs).solution.clone();
            let shifted = shift(table, &rhs_solution, loff);
            if table.get_mut(t).solution.union_with(&shifted) {
                changed.set(t);
            }
        } else {
            warn!(var = j, offset = loff, "untypesafe usage in store constraint");
        }
    }
    edge_added
}

/// Forward topological order over representatives: DFS from each
/// representative, appending a node only after all of its successors have
/// been appended, so nodes with no outgoing edges appear first in the
/// returned vector (§4.8 point 2). The worklist consumes this in the order
/// returned; being a valid topological order of a DAG-over-representatives
/// (zero-weight cycles having already been collapsed) is all correctness
/// requires — the solver is confluent regardless of which fair schedule is
/// used (§5), so the only thing this ordering affects is iteration count.
pub fn topo_order(graph: &ConstraintGraph, uf: &mut UnionFind) -> Vec<VarId> {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for start in 0..n as VarId {
        if uf.is_representative(start) && !visited[start as usize] {
            topo_visit(graph, uf, &mut visited, &mut order, start);
        }
    }
    order
}

fn topo_visit(
    graph: &ConstraintGraph,
    uf: &mut UnionFind,
    visited: &mut Vec<bool>,
    order: &mut Vec<VarId>,
    n: VarId,
) {
    visited[n as usize] = true;
    let succs: Vec<VarId> = graph.successors(n).map(|e| e.dest).collect();
    for w in succs {
        let w = uf.find(w);
        if !visited[w as usize] {
            topo_visit(graph, uf, visited, order, w);
        }
    }
    order.push(n);
}

/// Run the unification queue produced by [`scc::detect_and_collapse`]:
/// each id already carries its final representative in `uf` (set during the
/// SCC DFS itself), so merging each queue member directly into
/// `uf.find(member)` achieves the same grouped-by-representative effect as
/// processing contiguous runs, without needing to re-derive the grouping
/// here (§4.5).
pub fn run_unification_queue(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    queue: &[VarId],
    mut changed: Option<&mut ChangedSet>,
    stats: &mut Option<AnalysisStats>,
) {
    let mut i = 0;
    while i < queue.len() {
        let tounify = queue[i];
        let rep = uf.find(tounify);
        unify(table, graph, tounify, rep, &mut changed);
        if let Some(s) = stats {
            if changed.is_some() {
                s.record_dynamic_unify();
            } else {
                s.record_static_unify();
            }
        }
        i += 1;
    }
}

/// One full worklist pass (§4.8, step 3): pop representatives in
/// topological order, process changed ones' complex constraints, propagate
/// along successor edges. Returns whether any edge was added during this
/// pass (drives the next pass's cycle-detection decision).
pub fn worklist_pass(
    table: &mut VarTable,
    graph: &mut ConstraintGraph,
    uf: &mut UnionFind,
    order: &[VarId],
    changed: &mut ChangedSet,
) -> bool {
    let mut edge_added = false;
    for &i in order.iter() {
        let i = uf.find(i);
        if !changed.is_set(i) {
            continue;
        }
        changed.clear(i);
        edge_added |= process_complex(table, graph, uf, i, changed);

        let succs: Vec<(VarId, Vec<u32>)> = graph
            .successors(i)
            .map(|e| (e.dest, e.weights.iter().collect()))
            .collect();
        for (d, weights) in succs {
            let d = uf.find(d);
            let i_solution = table.get(i).solution.clone();
            let mut grew = false;
            for k in weights {
                let shifted = shift(table, &i_solution, k as u64);
                if table.get_mut(d).solution.union_with(&shifted) {
                    grew = true;
                }
            }
            if grew {
                changed.set(d);
            }
        }
    }
    trace!(edge_added, "worklist pass complete");
    edge_added
}
