//! pta-core: a single-procedure, field-sensitive, inclusion-based
//! (Andersen-style) points-to analysis.
//!
//! Feature-first layout, carried over from this crate's lineage:
//! - `domain/`         : the variable table, constraint representation, special vars
//! - `infrastructure/` : dense bitsets, the constraint graph, union-find,
//!                       cycle detection, offline substitution, the worklist solver
//! - `application/`    : the `PointsToAnalysis` facade collaborators drive
//! - `ports/`          : the read-only query trait surface
//!
//! Single-threaded, non-suspending, in-memory only: construct one
//! [`application::PointsToAnalysis`] per procedure, feed it variables and
//! constraints, call `solve()` once, then query it.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;
pub mod query;
pub mod stats;

pub use application::PointsToAnalysis;
pub use config::AnalysisConfig;
pub use domain::{Constraint, ConstraintExpr, DeclId, FieldSpec, VarId, VarInfo, VarTable};
pub use error::{PtaError, Result};
pub use ports::PointsToQuery;
pub use query::PointsToResult;
pub use stats::AnalysisStats;
