//! Constraint representation (§3, §9 "Tagged expressions").
//!
//! Replaces the inline `enum + fields` the lineage this is drawn from uses
//! with a proper tagged sum type: pattern matching on [`ConstraintExpr`]
//! stands in for the conditional chains that would otherwise inspect a
//! `lvalue`/`is_deref`/`is_addr` triple by hand.

use std::cmp::Ordering;

use crate::domain::var_info::VarId;

/// A constraint expression: a variable, optionally dereferenced or
/// address-taken, at a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintExpr {
    /// `var` (offset `off` into it, for field accesses).
    Scalar { var: VarId, off: u64 },
    /// `*var`.
    Deref { var: VarId, off: u64 },
    /// `&var`.
    AddrOf { var: VarId, off: u64 },
}

impl ConstraintExpr {
    pub fn var(&self) -> VarId {
        match *self {
            ConstraintExpr::Scalar { var, .. }
            | ConstraintExpr::Deref { var, .. }
            | ConstraintExpr::AddrOf { var, .. } => var,
        }
    }

    pub fn offset(&self) -> u64 {
        match *self {
            ConstraintExpr::Scalar { off, .. }
            | ConstraintExpr::Deref { off, .. }
            | ConstraintExpr::AddrOf { off, .. } => off,
        }
    }

    pub fn is_deref(&self) -> bool {
        matches!(self, ConstraintExpr::Deref { .. })
    }

    pub fn is_addr_of(&self) -> bool {
        matches!(self, ConstraintExpr::AddrOf { .. })
    }

    fn kind_rank(&self) -> u8 {
        match self {
            ConstraintExpr::Scalar { .. } => 0,
            ConstraintExpr::Deref { .. } => 1,
            ConstraintExpr::AddrOf { .. } => 2,
        }
    }

    fn with_var(&self, var: VarId) -> Self {
        match *self {
            ConstraintExpr::Scalar { off, .. } => ConstraintExpr::Scalar { var, off },
            ConstraintExpr::Deref { off, .. } => ConstraintExpr::Deref { var, off },
            ConstraintExpr::AddrOf { off, .. } => ConstraintExpr::AddrOf { var, off },
        }
    }
}

impl PartialOrd for ConstraintExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConstraintExpr {
    /// Ordered by kind, then var, then offset (§3).
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind_rank()
            .cmp(&other.kind_rank())
            .then_with(|| self.var().cmp(&other.var()))
            .then_with(|| self.offset().cmp(&other.offset()))
    }
}

/// A constraint `lhs := rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub lhs: ConstraintExpr,
    pub rhs: ConstraintExpr,
}

impl Constraint {
    pub fn new(lhs: ConstraintExpr, rhs: ConstraintExpr) -> Self {
        Constraint { lhs, rhs }
    }

    /// A constraint is "complex" if it involves a dereference on either
    /// side (§3: only these are attached to `complex(node)`).
    pub fn is_complex(&self) -> bool {
        self.lhs.is_deref() || self.rhs.is_deref()
    }

    /// Rewrite every occurrence of `from` (on either side) to `to`. Used
    /// during unification to merge a folded-away id's complex constraints
    /// into its representative's list (§4.5).
    pub fn rewritten(&self, from: VarId, to: VarId) -> Constraint {
        let lhs = if self.lhs.var() == from {
            self.lhs.with_var(to)
        } else {
            self.lhs
        };
        let rhs = if self.rhs.var() == from {
            self.rhs.with_var(to)
        } else {
            self.rhs
        };
        Constraint { lhs, rhs }
    }
}

impl PartialOrd for Constraint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constraint {
    /// Total ordering: lhs first, then rhs (§3). Complex-constraint lists
    /// are kept in this order so membership is a binary search.
    fn cmp(&self, other: &Self) -> Ordering {
        self.lhs.cmp(&other.lhs).then_with(|| self.rhs.cmp(&other.rhs))
    }
}

/// Merge `incoming` into `into`, preserving sort order, without
/// introducing duplicates. This is a sorted-sequence union, not a re-sort
/// (§9: "do not reorder on unification").
pub fn merge_sorted(into: &mut Vec<Constraint>, incoming: &[Constraint]) {
    if incoming.is_empty() {
        return;
    }
    let mut merged = Vec::with_capacity(into.len() + incoming.len());
    let mut i = 0;
    let mut j = 0;
    while i < into.len() && j < incoming.len() {
        match into[i].cmp(&incoming[j]) {
            Ordering::Less => {
                merged.push(into[i]);
                i += 1;
            }
            Ordering::Greater => {
                merged.push(incoming[j]);
                j += 1;
            }
            Ordering::Equal => {
                merged.push(into[i]);
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&into[i..]);
    merged.extend_from_slice(&incoming[j..]);
    *into = merged;
}
