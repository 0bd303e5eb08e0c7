//! Error types for pta-core
//!
//! Provides unified error handling for the points-to analysis core, split along
//! the taxonomy the analysis distinguishes: precision loss is never an error
//! value (it is silent by design, observable only through stats/dump), front-end
//! contract violations and resource exhaustion are fatal, and query results use
//! their own tri-state type rather than `Result` (see [`crate::query::PointsToResult`]).

use thiserror::Error;

/// Errors raised at the handful of fallible, non-contract boundaries of the
/// public API (e.g. a collaborator supplying an internally inconsistent field
/// layout before it would otherwise surface as a contract panic deeper in the
/// variable table).
#[derive(Debug, Error)]
pub enum PtaError {
    /// The front end asked for a field layout that violates the `next`-chain
    /// invariants (strictly increasing offsets, consistent fullsize).
    #[error("invalid field layout: {0}")]
    InvalidFieldLayout(String),

    /// A constraint referenced a variable id the table doesn't know about.
    #[error("unknown variable id: {0}")]
    UnknownVariable(u32),

    /// Allocation failure in one of the solve arenas.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),
}

/// Result alias for the fallible operations `PtaError` covers.
pub type Result<T> = std::result::Result<T, PtaError>;

/// Raise a front-end contract violation.
///
/// Contract violations are programmer errors, not recoverable conditions: the
/// front end promised canonicalized, internally consistent constraints and
/// failed to deliver one. The message is still built through [`PtaError`] so
/// panic output and `dump` diagnostics share a single format.
#[track_caller]
pub fn contract_violation(msg: impl Into<String>) -> ! {
    let err = PtaError::InvalidFieldLayout(msg.into());
    panic!("pta-core front-end contract violated: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        let e = PtaError::UnknownVariable(42);
        assert_eq!(e.to_string(), "unknown variable id: 42");
    }

    #[test]
    #[should_panic(expected = "pta-core front-end contract violated")]
    fn contract_violation_panics() {
        contract_violation("field offsets not strictly increasing");
    }
}
