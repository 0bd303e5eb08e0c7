//! Pure domain models: the variable table, constraint expressions, and the
//! fixed special variables. No algorithmic logic lives here — see
//! [`crate::infrastructure`] for the bitset, union-find, graph, SCC, and
//! solver machinery built on top of these types.

pub mod constraint;
pub mod special;
pub mod var_info;

pub use constraint::{Constraint, ConstraintExpr};
pub use var_info::{DeclId, FieldSpec, VarId, VarInfo, VarTable};
