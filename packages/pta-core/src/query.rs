//! Points-to query results (§4.9, §7): the solved graph is read-only from
//! here on, and a query never panics on a bad id — it degrades to
//! [`PointsToResult::Unknown`] rather than abort, since queries arrive from
//! arbitrary downstream consumers rather than the front end under contract.

use crate::domain::var_info::VarId;

/// Result of asking "what can `v` point to?" after the solver has reached a
/// fixed point.
///
/// Three-valued rather than a plain set: a solution containing the
/// `ANYTHING` sentinel means the true points-to set is the entire program's
/// address space (every variable, including ones created after this query),
/// which cannot be enumerated as a finite list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsToResult {
    /// A concrete, finite set of variable ids.
    KnownSet(Vec<VarId>),
    /// The solution includes `ANYTHING`: conceptually "every object in the
    /// program", not enumerable.
    KnownUniverse,
    /// `v` does not name a live variable (unknown id, or an id whose
    /// variable was folded away and no longer addresses anything on its
    /// own). Recoverable — callers should treat this as "no information",
    /// not as a contract violation.
    Unknown,
}

impl PointsToResult {
    pub fn is_empty_set(&self) -> bool {
        matches!(self, PointsToResult::KnownSet(v) if v.is_empty())
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            PointsToResult::KnownSet(v) => Some(v.len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_recognized() {
        assert!(PointsToResult::KnownSet(vec![]).is_empty_set());
        assert!(!PointsToResult::KnownSet(vec![1]).is_empty_set());
        assert!(!PointsToResult::Unknown.is_empty_set());
    }

    #[test]
    fn universe_and_unknown_have_no_len() {
        assert_eq!(PointsToResult::KnownUniverse.len(), None);
        assert_eq!(PointsToResult::Unknown.len(), None);
        assert_eq!(PointsToResult::KnownSet(vec![1, 2]).len(), Some(2));
    }
}
