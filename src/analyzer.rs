//! Connectivity analysis: grows one component at a time out of a
//! super-component.
//!
//! The analyzer owns the flattened [`LinkPool`] and a per-variable frequency
//! score; the [`Archetype`] scratch state is passed in explicitly by the
//! caller for every call.
//!
//! A traversal is a breadth-first search over the link pool, seeded with one
//! unseen variable. Variables are nodes and clauses not yet excluded are
//! hyperedges; only variables in [`VarState::Unseen`] are ever pulled in.
//!
//! [`VarState::Unseen`]: crate::archetype::VarState::Unseen

use log::trace;

use crate::archetype::Archetype;
use crate::assignment::Assignment;
use crate::component::Component;
use crate::formula::Formula;
use crate::links::{ClauseLits, Link, LinkPool};
use crate::stack::StackLevel;
use crate::types::{ClauseId, Lit, Var};

#[derive(Debug, Default)]
pub struct ComponentAnalyzer {
    max_variable_id: Var,
    max_clause_id: ClauseId,
    links: LinkPool,
    var_frequency_scores: Vec<u32>,
    search_stack: Vec<Var>,
}

impl ComponentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the link pool for `formula` and sizes `archetype` for it.
    pub fn initialize(&mut self, formula: &Formula, archetype: &mut Archetype) {
        self.max_variable_id = formula.max_variable_id();
        self.max_clause_id = formula.max_clause_id();
        self.links = LinkPool::build(formula);
        self.var_frequency_scores = vec![0; self.max_variable_id.index() + 1];
        self.search_stack = Vec::with_capacity(self.max_variable_id.index() + 1);
        archetype.init_arrays(self.max_variable_id, self.max_clause_id);
    }

    pub fn max_variable_id(&self) -> Var {
        self.max_variable_id
    }

    pub fn max_clause_id(&self) -> ClauseId {
        self.max_clause_id
    }

    pub fn links(&self) -> &LinkPool {
        &self.links
    }

    /// Frequency score of `v` as of the last traversal that reached it.
    pub fn score_of(&self, v: Var) -> u32 {
        self.var_frequency_scores[v.index()]
    }

    /// Variables reached by the last traversal, in visiting order.
    pub fn search_stack(&self) -> &[Var] {
        &self.search_stack
    }

    /// Binds `archetype` to the super-component of `top` and marks its active
    /// variables and its clauses unseen. Scores of those variables restart at 0.
    pub fn setup_analysis_context(
        &mut self,
        archetype: &mut Archetype,
        top: &StackLevel,
        super_comp: &Component,
        values: &Assignment,
    ) {
        archetype.re_initialize(top.super_component(), super_comp);

        for v in super_comp.vars() {
            if values.is_var_active(v) {
                archetype.set_var_in_sup_comp_unseen(v);
                self.var_frequency_scores[v.index()] = 0;
            }
        }
        for c in super_comp.clauses() {
            archetype.set_clause_in_sup_comp_unseen(c);
        }
    }

    pub fn is_unseen_and_active(&self, archetype: &Archetype, v: Var, values: &Assignment) -> bool {
        assert!(v <= self.max_variable_id);
        archetype.var_unseen_in_sup_comp(v) && values.is_var_active(v)
    }

    /// Explores the component of `v`.
    ///
    /// Returns `false` if it consists of `v` alone: such a variable is free,
    /// so `top` receives the factor 2 and `v` is claimed right away.
    pub fn explore_remaining_comp_of(
        &mut self,
        archetype: &mut Archetype,
        top: &mut StackLevel,
        v: Var,
        values: &Assignment,
    ) -> bool {
        assert!(archetype.var_unseen_in_sup_comp(v));
        self.record_component_of(archetype, v, values);

        if self.search_stack.len() == 1 {
            top.include_solution(2u32);
            archetype.set_var_in_other_comp(v);
            return false;
        }
        true
    }

    fn record_component_of(&mut self, archetype: &mut Archetype, var: Var, values: &Assignment) {
        let Self {
            links,
            var_frequency_scores: scores,
            search_stack,
            ..
        } = self;

        search_stack.clear();
        archetype.set_var_seen(var);
        search_stack.push(var);

        // The stack grows while it is being walked.
        let mut i = 0;
        while i < search_stack.len() {
            let vt = search_stack[i];
            i += 1;

            for link in links.links_of(vt) {
                match link {
                    Link::Binary(w) => {
                        if archetype.var_unseen_in_sup_comp(w) {
                            archetype.set_var_seen(w);
                            search_stack.push(w);
                            scores[w.index()] += 1;
                            scores[vt.index()] += 1;
                        }
                    }
                    Link::Ternary { clause, lits: [a, b] } => {
                        if !archetype.clause_unseen_in_sup_comp(clause) {
                            continue;
                        }
                        if values.is_satisfied(a) || values.is_satisfied(b) {
                            archetype.set_clause_nil(clause);
                        } else {
                            scores[vt.index()] += 1;
                            manage_search_occurrence_and_score_of(archetype, scores, search_stack, a, values);
                            manage_search_occurrence_and_score_of(archetype, scores, search_stack, b, values);
                            archetype.set_clause_seen(clause, values.is_active(a) && values.is_active(b));
                        }
                    }
                    Link::Long { clause, lits } => {
                        if archetype.clause_unseen_in_sup_comp(clause) {
                            search_clause(archetype, scores, search_stack, vt, clause, lits, values);
                        }
                    }
                }
            }
        }
    }
}

fn manage_search_occurrence_of(archetype: &mut Archetype, search_stack: &mut Vec<Var>, lit: Lit) -> bool {
    let v = lit.var();
    if archetype.var_unseen_in_sup_comp(v) {
        archetype.set_var_seen(v);
        search_stack.push(v);
        return true;
    }
    false
}

fn manage_search_occurrence_and_score_of(
    archetype: &mut Archetype,
    scores: &mut [u32],
    search_stack: &mut Vec<Var>,
    lit: Lit,
    values: &Assignment,
) -> bool {
    scores[lit.var().index()] += values.is_active(lit) as u32;
    manage_search_occurrence_of(archetype, search_stack, lit)
}

/// Visits a long clause reached from `vt`.
///
/// A literal whose variable lies outside the super-component and is not
/// assigned false may satisfy the clause from outside, so the clause is
/// excluded and everything done for it so far is undone.
fn search_clause(
    archetype: &mut Archetype,
    scores: &mut [u32],
    search_stack: &mut Vec<Var>,
    vt: Var,
    clause: ClauseId,
    lits: ClauseLits<'_>,
    values: &Assignment,
) {
    let mut all_lits_active = true;
    let stack_end = search_stack.len();

    for (i, lit) in lits.iter().enumerate() {
        if !archetype.var_nil(lit.var()) {
            manage_search_occurrence_and_score_of(archetype, scores, search_stack, lit, values);
            continue;
        }

        all_lits_active = false;
        if values.is_resolved(lit) {
            continue;
        }

        trace!("search_clause: {} satisfied through {}, rolling back", clause, lit);
        for v in search_stack.drain(stack_end..) {
            archetype.set_var_in_sup_comp_unseen(v);
        }
        archetype.set_clause_nil(clause);
        for earlier in lits.iter().take(i) {
            if values.is_active(earlier) {
                scores[earlier.var().index()] -= 1;
            }
        }
        break;
    }

    if !archetype.clause_nil(clause) {
        scores[vt.index()] += 1;
        archetype.set_clause_seen(clause, all_lits_active);
    }
}
