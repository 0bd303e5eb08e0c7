//! Constraint graph: per-node predecessor/successor adjacency, each edge
//! carrying a set of integer weights (§3, §4.3).
//!
//! §9 "Edge duplication": rather than the lineage's two independently
//! mutable views sharing a weights bitset by reference (an aliasing bug
//! surface), an edge is a single owned [`Edge`] record stored once in an
//! arena; `preds`/`succs` hold indices into that arena, so both views of an
//! edge are always the same object.

use crate::domain::var_info::VarId;
use crate::infrastructure::bitset::DenseBitset;

/// A directed edge `src -> dest`, weighted by a set of field offsets: the
/// offsets at which `src`'s solution is added into `dest`'s (§3).
#[derive(Debug, Clone)]
pub struct Edge {
    pub src: VarId,
    pub dest: VarId,
    pub weights: DenseBitset,
}

/// Index into the graph's edge arena.
pub type EdgeIdx = usize;

/// Predecessor/successor adjacency over representative ids.
///
/// Edges are only ever created between representatives (§4.3); callers are
/// responsible for resolving through [`crate::infrastructure::union_find::UnionFind`]
/// before calling into this type.
#[derive(Debug, Clone, Default)]
pub struct ConstraintGraph {
    edges: Vec<Edge>,
    /// `succs[n]` = indices of edges whose `src == n`.
    succs: Vec<Vec<EdgeIdx>>,
    /// `preds[n]` = indices of edges whose `dest == n`.
    preds: Vec<Vec<EdgeIdx>>,
}

impl ConstraintGraph {
    pub fn new() -> Self {
        ConstraintGraph::default()
    }

    fn ensure_capacity(&mut self, id: VarId) {
        let needed = id as usize + 1;
        if needed > self.succs.len() {
            self.succs.resize(needed, Vec::new());
            self.preds.resize(needed, Vec::new());
        }
    }

    /// Grow the adjacency arrays to cover `id`, even though it has no
    /// edges of its own. Without this, a variable with no edges and a
    /// higher id than any edge endpoint would be invisible to
    /// [`crate::infrastructure::solver::topo_order`] and never get its
    /// worklist-changed bit cleared, hanging the solver.
    pub fn grow_to(&mut self, id: VarId) {
        self.ensure_capacity(id);
    }

    pub fn num_nodes(&self) -> usize {
        self.succs.len()
    }

    /// Add weight `offset` to the edge `src -> dest`, creating it if
    /// absent. Returns true iff a new edge was created (the "edge added"
    /// signal the worklist solver tracks, §4.8/§9) or an existing edge
    /// gained a weight bit it didn't already have.
    pub fn add_edge(&mut self, src: VarId, dest: VarId, offset: u64) -> bool {
        self.ensure_capacity(src.max(dest));
        if let Some(&idx) = self.succs[src as usize].iter().find(|&&idx| self.edges[idx].dest == dest) {
            return self.edges[idx].weights.insert(offset as u32);
        }
        let mut weights = DenseBitset::new();
        weights.insert(offset as u32);
        let idx = self.edges.len();
        self.edges.push(Edge { src, dest, weights });
        self.succs[src as usize].push(idx);
        self.preds[dest as usize].push(idx);
        true
    }

    pub fn has_edge(&self, src: VarId, dest: VarId) -> bool {
        (src as usize) < self.succs.len()
            && self.succs[src as usize]
                .iter()
                .any(|&idx| self.edges[idx].dest == dest)
    }

    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx]
    }

    pub fn successors(&self, n: VarId) -> impl Iterator<Item = &Edge> + '_ {
        self.succs
            .get(n as usize)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn predecessors(&self, n: VarId) -> impl Iterator<Item = &Edge> + '_ {
        self.preds
            .get(n as usize)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Whether `n -> n` carries the zero-weight bit (used when clearing a
    /// self-loop's zero-weight bit after unification, §4.5).
    pub fn clear_self_zero_weight(&mut self, n: VarId) {
        if (n as usize) >= self.succs.len() {
            return;
        }
        if let Some(&idx) = self.succs[n as usize].iter().find(|&&idx| self.edges[idx].dest == n) {
            self.edges[idx].weights.remove(0);
            if self.edges[idx].weights.is_empty() {
                self.succs[n as usize].retain(|&i| i != idx);
                self.preds[n as usize].retain(|&i| i != idx);
            }
        }
    }

    /// Rewrite every edge endpoint equal to `from` to `to`, unioning
    /// weights where this creates a collision, then drop `from`'s now-empty
    /// adjacency lists. Used by unification (§4.5) to merge a folded-away
    /// node's edges into its representative.
    pub fn redirect(&mut self, from: VarId, to: VarId) {
        self.ensure_capacity(from.max(to));
        let from_succs = std::mem::take(&mut self.succs[from as usize]);
        for idx in from_succs {
            let dest = self.edges[idx].dest;
            let dest = if dest == from { to } else { dest };
            self.edges[idx].src = to;
            self.edges[idx].dest = dest;
            self.merge_or_append_succ(to, dest, idx);
            self.preds[dest as usize].retain(|&i| i != idx);
            if !self.preds[dest as usize].contains(&idx) {
                self.preds[dest as usize].push(idx);
            }
        }
        let from_preds = std::mem::take(&mut self.preds[from as usize]);
        for idx in from_preds {
            let src = self.edges[idx].src;
            if src == from {
                continue; // already handled as a succ above
            }
            self.edges[idx].dest = to;
            self.merge_or_append_pred(to, src, idx);
        }
    }

    fn merge_or_append_succ(&mut self, node: VarId, dest: VarId, new_idx: EdgeIdx) {
        if let Some(&existing) = self.succs[node as usize]
            .iter()
            .find(|&&i| i != new_idx && self.edges[i].dest == dest)
        {
            let weights = self.edges[new_idx].weights.clone();
            self.edges[existing].weights.union_with(&weights);
            self.edges[new_idx].weights.clear();
        } else if !self.succs[node as usize].contains(&new_idx) {
            self.succs[node as usize].push(new_idx);
        }
    }

    fn merge_or_append_pred(&mut self, node: VarId, src: VarId, new_idx: EdgeIdx) {
        if let Some(&existing) = self.preds[node as usize]
            .iter()
            .find(|&&i| i != new_idx && self.edges[i].src == src)
        {
            let weights = self.edges[new_idx].weights.clone();
            self.edges[existing].weights.union_with(&weights);
            self.edges[new_idx].weights.clear();
        } else if !self.preds[node as usize].contains(&new_idx) {
            self.preds[node as usize].push(new_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_edge_creates_then_reuses() {
        let mut g = ConstraintGraph::new();
        assert!(g.add_edge(0, 1, 0));
        assert!(!g.add_edge(0, 1, 0)); // same weight, no new bit
        assert!(g.add_edge(0, 1, 4)); // new weight bit
        assert!(g.has_edge(0, 1));
        let w: Vec<u32> = g.successors(0).next().unwrap().weights.iter().collect();
        assert_eq!(w, vec![0, 4]);
    }

    #[test]
    fn edges_appear_in_both_views() {
        let mut g = ConstraintGraph::new();
        g.add_edge(2, 5, 0);
        assert_eq!(g.successors(2).count(), 1);
        assert_eq!(g.predecessors(5).count(), 1);
    }

    #[test]
    fn clear_self_zero_weight_erases_empty_self_loop() {
        let mut g = ConstraintGraph::new();
        g.add_edge(1, 1, 0);
        g.clear_self_zero_weight(1);
        assert!(!g.has_edge(1, 1));
    }

    #[test]
    fn grow_to_covers_edgeless_high_ids() {
        let mut g = ConstraintGraph::new();
        g.add_edge(0, 1, 0);
        g.grow_to(5);
        assert_eq!(g.num_nodes(), 6);
        assert_eq!(g.successors(5).count(), 0);
    }

    #[test]
    fn redirect_moves_edges_to_representative() {
        let mut g = ConstraintGraph::new();
        g.add_edge(0, 2, 0);
        g.add_edge(3, 0, 1);
        g.redirect(0, 1);
        assert!(g.has_edge(1, 2));
        assert!(g.has_edge(3, 1));
        assert!(!g.has_edge(0, 2));
    }

    proptest! {
        /// Edge canonicality (§8): every live edge appears in both
        /// `succs[src]` and `preds[dest]` with identical, non-empty weights.
        #[test]
        fn every_edge_is_canonical(
            edges in proptest::collection::vec((0u32..12, 0u32..12, 0u32..8), 0..60),
        ) {
            let mut g = ConstraintGraph::new();
            for (src, dest, off) in edges {
                g.add_edge(src, dest, off as u64);
            }
            for src in 0..12u32 {
                for e in g.successors(src) {
                    prop_assert!(!e.weights.is_empty());
                    let found_in_preds = g
                        .predecessors(e.dest)
                        .any(|pe| pe.src == src && pe.dest == e.dest && weights_eq(&pe.weights, &e.weights));
                    prop_assert!(found_in_preds);
                }
            }
        }
    }

    fn weights_eq(a: &DenseBitset, b: &DenseBitset) -> bool {
        a.is_subset_of(b) && b.is_subset_of(a)
    }
}
