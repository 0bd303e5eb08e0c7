//! Variable table and field layout (§4.1).
//!
//! `VarInfo` no longer carries a `node` field the way the lineage this is
//! drawn from does (a raw, path-compression-free union-find pointer mutated
//! in place). Representative tracking lives in [`crate::infrastructure::union_find::UnionFind`]
//! instead; every caller that needs "the representative of v" calls
//! `UnionFind::find(v)`.

use crate::domain::constraint::Constraint;
use crate::error::contract_violation;
use crate::infrastructure::bitset::DenseBitset;

/// Stable, monotonically assigned identity. Never reused.
pub type VarId = u32;

/// Opaque back-reference to the IR entity that owns a variable. Absent for
/// artificial variables and synthesized temporaries.
pub type DeclId = u64;

/// Sentinel used for `size`/`fullsize` when the front end couldn't determine
/// a concrete size (unions, VLAs, opaque types folded to "unknown size").
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// A single entry in the variable table.
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub id: VarId,
    pub name: String,
    pub decl: Option<DeclId>,

    /// Offset within the enclosing aggregate, in bits. Zero for non-fields.
    pub offset: u64,
    /// This field/variable's own size, in bits.
    pub size: u64,
    /// Size of the enclosing aggregate; equal to `size` for non-fields.
    pub fullsize: u64,

    /// Next field in offset order within the same aggregate, if any.
    /// Invariant: walking `next` from any aggregate's first field yields
    /// strictly increasing `offset`, and every field's `fullsize` equals the
    /// base's `fullsize`.
    pub next: Option<VarId>,

    /// Points-to set. Only meaningful when this id is its own representative.
    pub solution: DenseBitset,
    /// Ids currently folded into this representative (including itself).
    /// Only meaningful when this id is its own representative.
    pub variables: DenseBitset,
    /// Constraints with a dereference on either side, or a non-trivial
    /// offset, attached to this node. Kept in `Constraint`'s total order so
    /// membership during merge is a binary search. Only meaningful when this
    /// id is its own representative.
    pub complex: Vec<Constraint>,

    pub address_taken: bool,
    pub indirect_target: bool,
    pub is_artificial_var: bool,
    pub is_unknown_size_var: bool,
    pub has_union: bool,

    /// True only for the chain-head id `new_variable` creates when a
    /// declaration is field-decomposed. It spans `[0, fullsize)` like any
    /// of its fields would, but it is not itself a field: it exists purely
    /// to anchor the `next` chain and as the declaration's own id. Without
    /// this flag, [`VarTable::first_vi_for_offset`] would match it ahead of
    /// every real field and never resolve a field lookup correctly.
    pub is_aggregate_base: bool,
}

impl VarInfo {
    fn new(id: VarId, name: impl Into<String>, decl: Option<DeclId>) -> Self {
        VarInfo {
            id,
            name: name.into(),
            decl,
            offset: 0,
            size: 0,
            fullsize: 0,
            next: None,
            solution: DenseBitset::new(),
            variables: DenseBitset::new(),
            complex: Vec::new(),
            address_taken: false,
            indirect_target: false,
            is_artificial_var: false,
            is_unknown_size_var: false,
            has_union: false,
            is_aggregate_base: false,
        }
    }
}

/// A field to be created as part of a field-sensitive aggregate
/// decomposition, supplied by the front-end collaborator.
///
/// `decl` is the field's own external sub-storage id, distinct from the
/// aggregate's — the collaborator must supply one so that `points_to`
/// results naming this field can be reported back as that id rather than
/// collapsing every field of an aggregate onto the same decl (§4.9).
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub decl: DeclId,
    pub offset: u64,
    pub size: u64,
}

/// The growing table of variable records.
#[derive(Debug, Clone)]
pub struct VarTable {
    vars: Vec<VarInfo>,
}

impl VarTable {
    /// Builds a table already seeded with the four special variables
    /// (§3: NULL, ANYTHING, READONLY, INTEGER), in that order.
    pub fn with_special_vars() -> Self {
        let mut table = VarTable { vars: Vec::new() };
        let null = table.new_artificial("NULL");
        let anything = table.new_artificial("ANYTHING");
        let readonly = table.new_artificial("READONLY");
        let integer = table.new_artificial("INTEGER");
        debug_assert_eq!(null, crate::domain::special::NULL);
        debug_assert_eq!(anything, crate::domain::special::ANYTHING);
        debug_assert_eq!(readonly, crate::domain::special::READONLY);
        debug_assert_eq!(integer, crate::domain::special::INTEGER);
        for id in [null, anything, readonly, integer] {
            table.vars[id as usize].variables.insert(id);
        }
        // ANYTHING points to itself; READONLY and INTEGER point to ANYTHING
        // (crate::domain::special's seeded-self-loop contract).
        table.vars[anything as usize].solution.insert(anything);
        table.vars[readonly as usize].solution.insert(anything);
        table.vars[integer as usize].solution.insert(anything);
        table
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, id: VarId) -> &VarInfo {
        &self.vars[id as usize]
    }

    pub fn get_mut(&mut self, id: VarId) -> &mut VarInfo {
        &mut self.vars[id as usize]
    }

    pub fn contains(&self, id: VarId) -> bool {
        (id as usize) < self.vars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarInfo> {
        self.vars.iter()
    }

    /// `new_artificial(name) -> id`. Sizes are left at zero (artificial
    /// variables collapse any offset to zero via [`VarTable::type_safe`]).
    pub fn new_artificial(&mut self, name: impl Into<String>) -> VarId {
        let id = self.vars.len() as VarId;
        let mut vi = VarInfo::new(id, name, None);
        vi.is_artificial_var = true;
        vi.variables.insert(id);
        self.vars.push(vi);
        id
    }

    /// `create_variable(decl, name) -> id`, without field decomposition.
    /// Used directly by `new_variable` for non-aggregate or non-field-sensitive
    /// declarations, and by the aggregate decomposition path for each field.
    fn push_variable(
        &mut self,
        decl: Option<DeclId>,
        name: impl Into<String>,
        offset: u64,
        size: u64,
        fullsize: u64,
        unknown_size: bool,
    ) -> VarId {
        let id = self.vars.len() as VarId;
        let mut vi = VarInfo::new(id, name, decl);
        vi.offset = offset;
        vi.size = size;
        vi.fullsize = fullsize;
        vi.is_unknown_size_var = unknown_size;
        vi.variables.insert(id);
        self.vars.push(vi);
        id
    }

    /// `new_variable(decl, name, size, fullsize, offset, parent) -> id`.
    ///
    /// When `size` is `None` the variable is of unknown size (unions, VLAs,
    /// opaque aggregates): both `size` and `fullsize` become
    /// [`UNKNOWN_SIZE`] and `is_unknown_size_var` is set, matching
    /// `type_safe`'s "offsets collapse to the whole" treatment.
    ///
    /// When `fields` is non-empty and `field_sensitive` is true, the base
    /// variable is created with the aggregate's full size, followed by one
    /// `VarInfo` per field sharing that `fullsize`, linked in `next` order.
    /// `sort_fields` must already have produced `fields` in ascending offset
    /// order; this is checked here rather than silently re-sorted, since a
    /// front end that emits an unsorted layout has violated the contract.
    pub fn new_variable(
        &mut self,
        decl: Option<DeclId>,
        name: impl Into<String>,
        size: Option<u64>,
        field_sensitive: bool,
        fields: &[FieldSpec],
    ) -> VarId {
        let name = name.into();
        let Some(size) = size else {
            return self.push_variable(decl, name, 0, UNKNOWN_SIZE, UNKNOWN_SIZE, true);
        };

        if fields.is_empty() || !field_sensitive {
            return self.push_variable(decl, name, 0, size, size, false);
        }

        let mut prev_offset = None;
        for f in fields {
            if let Some(p) = prev_offset {
                if f.offset <= p {
                    contract_violation(format!(
                        "field layout for `{name}` is not strictly increasing in offset"
                    ));
                }
            }
            prev_offset = Some(f.offset);
        }

        let base_id = self.push_variable(decl, name.clone(), 0, size, size, false);
        self.vars[base_id as usize].is_aggregate_base = true;
        let mut prev = base_id;
        for f in fields {
            let fid = self.push_variable(Some(f.decl), f.name.clone(), f.offset, f.size, size, false);
            self.vars[prev as usize].next = Some(fid);
            prev = fid;
        }
        base_id
    }

    /// Stable sort of `base`'s linked field list by `(offset, size)`.
    /// No-op if `base` has no fields (no `next` chain).
    pub fn sort_fields(&mut self, base: VarId) {
        let mut chain = Vec::new();
        let mut cur = self.vars[base as usize].next;
        while let Some(id) = cur {
            chain.push(id);
            cur = self.vars[id as usize].next;
        }
        if chain.is_empty() {
            return;
        }
        chain.sort_by_key(|&id| {
            let vi = &self.vars[id as usize];
            (vi.offset, vi.size)
        });
        let mut prev = base;
        for id in chain {
            self.vars[prev as usize].next = Some(id);
            prev = id;
        }
        self.vars[prev as usize].next = None;
    }

    /// `first_vi_for_offset(start, off) -> id`: walks `next` from `start`
    /// and returns the first field whose range `[offset, offset+size)`
    /// contains `off`.
    ///
    /// # Panics
    /// Panics if no such field exists. Callers guarantee `off < fullsize`
    /// (typically by calling [`VarTable::type_safe`] first).
    pub fn first_vi_for_offset(&self, start: VarId, off: u64) -> VarId {
        let mut cur = start;
        loop {
            let vi = &self.vars[cur as usize];
            if !vi.is_aggregate_base && vi.offset <= off && off < vi.offset + vi.size.max(1) {
                return cur;
            }
            match vi.next {
                Some(n) => cur = n,
                None => contract_violation(format!(
                    "first_vi_for_offset: no field of `{}` covers offset {off}",
                    vi.name
                )),
            }
        }
    }

    /// `type_safe(n, &mut off) -> bool` (§4.1).
    ///
    /// For the global "anything" variable, artificial variables, and
    /// unknown-size variables, any offset acts like the whole object: `off`
    /// is forced to zero and `true` is returned. Otherwise returns whether
    /// `offset(n) + off < fullsize(n)`.
    pub fn type_safe(&self, n: VarId, off: &mut u64) -> bool {
        let vi = &self.vars[n as usize];
        if n == crate::domain::special::ANYTHING || vi.is_artificial_var || vi.is_unknown_size_var
        {
            *off = 0;
            return true;
        }
        n > crate::domain::special::ANYTHING && vi.offset + *off < vi.fullsize
    }
}
