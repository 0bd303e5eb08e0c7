//! Solver internals: dense bitsets, the constraint graph, union-find,
//! cycle detection, offline substitution, and the worklist solver itself.

pub mod bitset;
pub mod graph;
pub mod offline_subst;
pub mod scc;
pub mod solver;
pub mod union_find;
