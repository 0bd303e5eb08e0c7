//! Special variables, created at initialization with fixed low ids.
//!
//! Referenced by name constants rather than by global pointers, so callers
//! never have to remember "id 1 means anything" — they write [`ANYTHING`].

use crate::domain::var_info::VarId;

/// Represents the null pointer target.
pub const NULL: VarId = 0;

/// Represents "any storage". Seeded with a self-loop `ANYTHING := &ANYTHING`
/// so that dereferencing it stays at `ANYTHING`.
pub const ANYTHING: VarId = 1;

/// Represents read-only memory; seeded with `READONLY := &ANYTHING`.
pub const READONLY: VarId = 2;

/// Represents integers coerced to pointers; seeded with `INTEGER := &ANYTHING`.
pub const INTEGER: VarId = 3;

/// Number of special variables created before any user variable.
pub const NUM_SPECIAL_VARS: u32 = 4;

/// True for any of the four fixed artificial ids.
pub fn is_special(id: VarId) -> bool {
    id < NUM_SPECIAL_VARS
}
