//! Public facade: the single entry point collaborators drive (§6).
//!
//! Owns the variable table, constraint graph, union-find forest, and the
//! front end's append-only constraint list until `solve()` consumes it.

use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::domain::constraint::{Constraint, ConstraintExpr};
use crate::domain::special;
use crate::domain::var_info::{DeclId, FieldSpec, VarId, VarTable, UNKNOWN_SIZE};
use crate::error::contract_violation;
use crate::infrastructure::graph::ConstraintGraph;
use crate::infrastructure::solver::{self, ChangedSet};
use crate::infrastructure::union_find::UnionFind;
use crate::infrastructure::{offline_subst, scc};
use crate::query::PointsToResult;
use crate::stats::AnalysisStats;

/// A single-procedure, field-sensitive, Andersen-style points-to analysis.
///
/// Collaborators emit variables and constraints through the inbound
/// methods, call [`PointsToAnalysis::solve`] once, then read results back
/// through [`PointsToAnalysis::points_to`]/[`PointsToAnalysis::for_each_in_solution`].
/// Not reusable across procedures — construct a fresh instance per one.
pub struct PointsToAnalysis {
    table: VarTable,
    graph: ConstraintGraph,
    uf: UnionFind,
    constraints: Vec<Constraint>,
    config: AnalysisConfig,
    stats: Option<AnalysisStats>,
    solved: bool,
    next_temp: u32,
}

impl PointsToAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        let table = VarTable::with_special_vars();
        let uf = UnionFind::new(table.len());
        let stats = config.emit_stats.then(AnalysisStats::default);
        PointsToAnalysis {
            table,
            graph: ConstraintGraph::new(),
            uf,
            constraints: Vec::new(),
            config,
            stats,
            solved: false,
            next_temp: 0,
        }
    }

    pub fn config(&self) -> AnalysisConfig {
        self.config
    }

    pub fn stats(&self) -> Option<&AnalysisStats> {
        self.stats.as_ref()
    }

    fn check_var(&self, id: VarId) {
        if !self.table.contains(id) {
            contract_violation(format!("constraint references unknown variable id {id}"));
        }
    }

    /// `new_artificial(name) → id`.
    pub fn new_artificial(&mut self, name: impl Into<String>) -> VarId {
        let id = self.table.new_artificial(name);
        self.uf.grow_to(id);
        if let Some(s) = &mut self.stats {
            s.record_vars_created(1);
        }
        id
    }

    /// `new_variable(decl, name, size, fullsize, offset, parent?) → id`.
    ///
    /// `size` is `None` for unknown-size declarations. `fields` drives
    /// field-sensitive decomposition per §4.1 and is ignored when
    /// `self.config.field_sensitive` is false.
    pub fn new_variable(
        &mut self,
        decl: Option<DeclId>,
        name: impl Into<String>,
        size: Option<u64>,
        fields: &[FieldSpec],
    ) -> VarId {
        let created_before = self.table.len();
        let id = self
            .table
            .new_variable(decl, name, size, self.config.field_sensitive, fields);
        let created = self.table.len() - created_before;
        self.uf.grow_to(self.table.len() as VarId - 1);
        if let Some(s) = &mut self.stats {
            s.record_vars_created(created as u64);
        }
        id
    }

    pub fn sort_fields(&mut self, base: VarId) {
        self.check_var(base);
        self.table.sort_fields(base);
    }

    /// `field_var(base, offset) -> id`: the field of `base`'s aggregate
    /// whose range covers `offset`, per [`VarTable::first_vi_for_offset`].
    /// Lets a collaborator recover the per-field variable ids `new_variable`
    /// created internally for a field-sensitive declaration.
    pub fn field_var(&self, base: VarId, offset: u64) -> VarId {
        self.check_var(base);
        self.table.first_vi_for_offset(base, offset)
    }

    fn fresh_temp(&mut self) -> VarId {
        self.next_temp += 1;
        let name = format!("%t{}", self.next_temp);
        // Unknown-size so `type_safe` always accepts offset 0 on it; a
        // split temp is only ever used as a plain scalar endpoint.
        let id = self.table.new_variable(None, name, None, false, &[]);
        self.uf.grow_to(id);
        if let Some(s) = &mut self.stats {
            s.record_vars_created(1);
        }
        id
    }

    /// `add_constraint(lhs, rhs)`: canonicalize per §4.2 and append to the
    /// raw constraint list `solve()` will consume.
    pub fn add_constraint(&mut self, lhs: ConstraintExpr, rhs: ConstraintExpr) {
        self.check_var(lhs.var());
        self.check_var(rhs.var());

        let anything_scalar = ConstraintExpr::Scalar { var: special::ANYTHING, off: 0 };

        // Rule 1: ANYTHING := ANYTHING is discarded.
        if lhs == anything_scalar && rhs == anything_scalar {
            return;
        }

        // Rule 2: &ANYTHING := x becomes x := &ANYTHING.
        let (lhs, rhs) = if lhs.is_addr_of() && lhs.var() == special::ANYTHING {
            (
                ConstraintExpr::Scalar { var: rhs.var(), off: rhs.offset() },
                ConstraintExpr::AddrOf { var: special::ANYTHING, off: 0 },
            )
        } else {
            (lhs, rhs)
        };

        // Rule 3: *p := *q is split via a fresh scalar temp.
        if lhs.is_deref() && rhs.is_deref() {
            let t = self.fresh_temp();
            let temp = ConstraintExpr::Scalar { var: t, off: 0 };
            self.push_canonicalized(temp, rhs);
            self.push_canonicalized(lhs, temp);
            return;
        }

        self.push_canonicalized(lhs, rhs);
    }

    /// Apply rules 4/5 (address-taken / indirect-target bookkeeping) and
    /// append. Assumes rules 1-3 already handled by the caller.
    fn push_canonicalized(&mut self, lhs: ConstraintExpr, rhs: ConstraintExpr) {
        if rhs.is_addr_of() {
            self.table.get_mut(rhs.var()).address_taken = true;
        }
        if !lhs.is_deref() && rhs.is_deref() {
            self.table.get_mut(lhs.var()).indirect_target = true;
        }
        self.constraints.push(Constraint::new(lhs, rhs));
    }

    /// Expand an aggregate-to-aggregate copy into per-field constraints
    /// (§4.2, aggregate-copy paragraph). At most one of `lhs`/`rhs` may be
    /// a dereference; the non-deref side supplies the field walk, and the
    /// deref side keeps its own variable fixed while its offset advances
    /// by each field's relative offset. When the aggregates' sizes
    /// disagree, only `min(lhs_size, rhs_size)` worth of fields are
    /// expanded (§11 Open Question 2).
    pub fn add_aggregate_copy(&mut self, lhs: ConstraintExpr, rhs: ConstraintExpr) {
        self.check_var(lhs.var());
        self.check_var(rhs.var());
        if lhs.is_deref() && rhs.is_deref() {
            contract_violation(
                "aggregate copy with both sides dereferenced must be split by the caller first",
            );
        }

        let lhs_full = self.table.get(lhs.var()).fullsize;
        let rhs_full = self.table.get(rhs.var()).fullsize;
        if lhs_full == UNKNOWN_SIZE || rhs_full == UNKNOWN_SIZE {
            contract_violation("aggregate copy requires concrete sizes on both sides");
        }
        let limit = lhs_full.min(rhs_full);

        if !lhs.is_deref() && !rhs.is_deref() {
            let mut l = Some(lhs.var());
            let mut r = Some(rhs.var());
            while let (Some(li), Some(ri)) = (l, r) {
                let lv = self.table.get(li);
                let rv = self.table.get(ri);
                if lv.offset >= limit || rv.offset >= limit {
                    break;
                }
                self.add_constraint(
                    ConstraintExpr::Scalar { var: li, off: 0 },
                    ConstraintExpr::Scalar { var: ri, off: 0 },
                );
                l = lv.next;
                r = rv.next;
            }
        } else if rhs.is_deref() {
            let mut l = Some(lhs.var());
            while let Some(li) = l {
                let lv = self.table.get(li);
                if lv.offset >= limit {
                    break;
                }
                self.add_constraint(
                    ConstraintExpr::Scalar { var: li, off: 0 },
                    ConstraintExpr::Deref { var: rhs.var(), off: rhs.offset() + lv.offset },
                );
                l = lv.next;
            }
        } else {
            let mut r = Some(rhs.var());
            while let Some(ri) = r {
                let rv = self.table.get(ri);
                if rv.offset >= limit {
                    break;
                }
                self.add_constraint(
                    ConstraintExpr::Deref { var: lhs.var(), off: lhs.offset() + rv.offset },
                    ConstraintExpr::Scalar { var: ri, off: 0 },
                );
                r = rv.next;
            }
        }
    }

    /// `solve()` (§4.3-§4.8): build the initial graph, collapse cycles
    /// once, run offline variable substitution, then iterate the worklist
    /// to a fixed point. The constraint list is consumed; calling this
    /// twice on the same instance is a contract violation.
    pub fn solve(&mut self) {
        if self.solved {
            contract_violation("solve() called twice on the same analysis instance");
        }
        self.solved = true;
        info!(vars = self.table.len(), constraints = self.constraints.len(), "solving");

        let constraints = std::mem::take(&mut self.constraints);
        solver::build_graph(&mut self.table, &mut self.graph, constraints, &mut self.stats);
        // Every variable must be visible to topo_order/worklist_pass, even
        // ones with no edges of their own (otherwise their changed bit is
        // never cleared and the fixed-point loop never terminates).
        if !self.table.is_empty() {
            self.graph.grow_to(self.table.len() as VarId - 1);
        }

        let initial_queue = scc::detect_and_collapse(&self.graph, &mut self.uf);
        solver::run_unification_queue(
            &mut self.table,
            &mut self.graph,
            &mut self.uf,
            &initial_queue,
            None,
            &mut self.stats,
        );

        offline_subst::run(&mut self.table, &mut self.graph, &mut self.uf, &mut self.stats);

        let mut changed = ChangedSet::all_set(self.table.len());
        for id in 0..self.table.len() as VarId {
            if !self.uf.is_representative(id) {
                changed.clear(id);
            }
        }

        let mut edge_added = false;
        let mut first_iteration = true;
        while changed.count() > 0 {
            if edge_added && !first_iteration {
                let queue = scc::detect_and_collapse(&self.graph, &mut self.uf);
                solver::run_unification_queue(
                    &mut self.table,
                    &mut self.graph,
                    &mut self.uf,
                    &queue,
                    Some(&mut changed),
                    &mut self.stats,
                );
            }
            let order = solver::topo_order(&self.graph, &mut self.uf);
            edge_added = solver::worklist_pass(
                &mut self.table,
                &mut self.graph,
                &mut self.uf,
                &order,
                &mut changed,
            );
            if let Some(s) = &mut self.stats {
                s.record_iteration();
            }
            first_iteration = false;
        }
        debug!("solve reached fixed point");
    }

    /// `points_to(id) → result` (§4.9). Never panics on a bad id.
    pub fn points_to(&self, id: VarId) -> PointsToResult {
        if !self.table.contains(id) {
            return PointsToResult::Unknown;
        }
        let queried = self.table.get(id);
        if queried.size != queried.fullsize && queried.decl.is_none() {
            return PointsToResult::Unknown;
        }

        let rep = self.uf.find_readonly(id);
        let vi = self.table.get(rep);

        let mut out = Vec::new();
        for member in vi.solution.iter() {
            let member_vi = self.table.get(member);
            // §4.9: any artificial internal var in the solution — not just
            // NULL/ANYTHING/READONLY/INTEGER, but also a front end's own
            // `new_artificial` ids (heap abstractions and the like) — means
            // the pointer may reach outside the tracked declarations, so the
            // whole query widens to "may point anywhere" rather than
            // silently dropping that member from the reported set.
            if special::is_special(member) || member_vi.is_artificial_var {
                return PointsToResult::KnownUniverse;
            }
            if let Some(decl) = member_vi.decl {
                out.push(decl as VarId);
            }
        }
        out.sort_unstable();
        PointsToResult::KnownSet(out)
    }

    /// `for_each_in_solution(id, cb)`: visit solution members (raw
    /// variable ids, not external decl ids) in ascending order.
    pub fn for_each_in_solution(&self, id: VarId, mut cb: impl FnMut(VarId)) {
        if !self.table.contains(id) {
            return;
        }
        let rep = self.uf.find_readonly(id);
        for member in self.table.get(rep).solution.iter() {
            cb(member);
        }
    }

    /// `dump(sink)`: human-readable dump of variables, their representative,
    /// and their solution (§6, §10.6).
    pub fn dump(&self, sink: &mut dyn std::fmt::Write) -> std::fmt::Result {
        writeln!(sink, "# variables")?;
        for vi in self.table.iter() {
            let rep = self.uf.find_readonly(vi.id);
            writeln!(
                sink,
                "{:>4}  {:<20} rep={:<4} solution={:?}",
                vi.id, vi.name, rep, vi.solution
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(var: VarId, off: u64) -> ConstraintExpr {
        ConstraintExpr::Scalar { var, off }
    }
    fn addr(var: VarId) -> ConstraintExpr {
        ConstraintExpr::AddrOf { var, off: 0 }
    }
    fn deref(var: VarId, off: u64) -> ConstraintExpr {
        ConstraintExpr::Deref { var, off }
    }

    #[test]
    fn simple_address_and_copy_propagates() {
        // p := &y; q := p  =>  points_to(q) should report y's decl id.
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        let y_decl = 100u64;
        let y = a.new_variable(Some(y_decl), "y", Some(64), &[]);
        let p = a.new_variable(Some(2), "p", Some(64), &[]);
        let q = a.new_variable(Some(3), "q", Some(64), &[]);
        a.add_constraint(scalar(p, 0), addr(y));
        a.add_constraint(scalar(q, 0), scalar(p, 0));
        a.solve();
        match a.points_to(q) {
            PointsToResult::KnownSet(members) => assert!(members.contains(&(y_decl as VarId))),
            other => panic!("expected KnownSet, got {other:?}"),
        }
    }

    #[test]
    fn load_store_through_pointer_propagates() {
        // p := &y; *p := &z; x := *p  =>  x should see z's decl id.
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        let y = a.new_variable(Some(1), "y", Some(64), &[]);
        let z_decl = 200u64;
        let z = a.new_variable(Some(z_decl), "z", Some(64), &[]);
        let p = a.new_variable(Some(3), "p", Some(64), &[]);
        let x = a.new_variable(Some(4), "x", Some(64), &[]);
        a.add_constraint(scalar(p, 0), addr(y));
        a.add_constraint(deref(p, 0), addr(z));
        a.add_constraint(scalar(x, 0), deref(p, 0));
        a.solve();
        match a.points_to(x) {
            PointsToResult::KnownSet(members) => assert!(members.contains(&(z_decl as VarId))),
            other => panic!("expected KnownSet, got {other:?}"),
        }
    }

    #[test]
    fn unknown_id_is_unknown() {
        let a = PointsToAnalysis::new(AnalysisConfig::default());
        assert_eq!(a.points_to(9999), PointsToResult::Unknown);
    }

    #[test]
    fn double_deref_copy_is_split_via_temp() {
        // *p := *q. Must not panic, and should still solve to completion.
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        let y = a.new_variable(Some(1), "y", Some(64), &[]);
        let p = a.new_variable(Some(2), "p", Some(64), &[]);
        let q = a.new_variable(Some(3), "q", Some(64), &[]);
        let r = a.new_variable(Some(4), "r", Some(64), &[]);
        a.add_constraint(scalar(q, 0), addr(r));
        a.add_constraint(deref(q, 0), addr(y));
        a.add_constraint(deref(p, 0), deref(q, 0));
        a.solve();
        let _ = a.points_to(p);
    }

    #[test]
    fn pointer_to_heap_artificial_widens_to_known_universe() {
        // p := &heap  =>  points_to(p) must widen rather than report an
        // empty KnownSet, since `heap` has no decl and would otherwise be
        // silently dropped from the result.
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        let heap = a.new_artificial("heap");
        let p = a.new_variable(Some(1), "p", Some(64), &[]);
        a.add_constraint(scalar(p, 0), addr(heap));
        a.solve();
        assert_eq!(a.points_to(p), PointsToResult::KnownUniverse);
    }

    #[test]
    fn anything_self_assignment_is_discarded() {
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        let before = a.constraints.len();
        a.add_constraint(
            scalar(special::ANYTHING, 0),
            scalar(special::ANYTHING, 0),
        );
        assert_eq!(a.constraints.len(), before);
    }

    #[test]
    #[should_panic(expected = "solve() called twice")]
    fn solving_twice_is_a_contract_violation() {
        let mut a = PointsToAnalysis::new(AnalysisConfig::default());
        a.solve();
        a.solve();
    }
}
