//! Scratch state for one decomposition pass.
//!
//! Every variable id and every clause id owns a [`Slot`] at the same index.
//! The two halves of a slot are independent: a variable state and a clause
//! state stored side by side, never compared with each other.
//!
//! The archetype is bound to one super-component at a time (see
//! [`Archetype::re_initialize`]); after the analyzer marks a component as
//! seen, [`Archetype::make_component_from_state`] sweeps the super-component
//! and packs the seen members into a [`Component`] and its [`Signature`].

use crate::component::{Component, Signature};
use crate::types::{CacheEntryId, ClauseId, Var};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum VarState {
    /// Not a candidate: outside the super-component, or assigned.
    #[default]
    Nil,
    /// Active member of the super-component, not reached yet.
    Unseen,
    /// Reached by the current traversal.
    Seen,
    /// Claimed by a component emitted earlier at this node.
    InOtherComp,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ClauseState {
    /// Outside the super-component, or excluded as satisfied.
    #[default]
    Nil,
    Unseen,
    Seen { all_lits_active: bool },
    InOtherComp,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Slot {
    pub var: VarState,
    pub clause: ClauseState,
}

#[derive(Debug, Default)]
pub struct Archetype {
    slots: Vec<Slot>,
    /// Stack index and cache id of the bound super-component.
    binding: Option<(usize, CacheEntryId)>,
    signature_buf: Vec<u32>,
}

impl Archetype {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates one slot per id in `0..=max(max_var, max_clause)`.
    pub fn init_arrays(&mut self, max_var: Var, max_clause: ClauseId) {
        let n = max_var.index().max(max_clause.index()) + 1;
        self.slots = vec![Slot::default(); n];
        self.binding = None;
        self.signature_buf.clear();
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Resets every slot, over the full width.
    pub fn clear_arrays(&mut self) {
        self.slots.fill(Slot::default());
    }

    /// Clears the state and binds it to the super-component at `stack_index`.
    pub fn re_initialize(&mut self, stack_index: usize, super_comp: &Component) {
        assert!(!self.slots.is_empty(), "Archetype is not initialized");
        self.clear_arrays();
        self.binding = Some((stack_index, super_comp.id()));
        let needed = super_comp.num_variables() + super_comp.num_long_clauses() + 2;
        self.signature_buf.clear();
        self.signature_buf.reserve(needed);
    }

    pub fn bound_stack_index(&self) -> Option<usize> {
        self.binding.map(|(index, _)| index)
    }

    pub fn slot(&self, index: usize) -> Slot {
        self.slots[index]
    }

    // Variable half.

    pub fn var_state(&self, v: Var) -> VarState {
        self.slots[v.index()].var
    }

    pub fn set_var_state(&mut self, v: Var, state: VarState) {
        debug_assert!(!v.is_sentinel());
        self.slots[v.index()].var = state;
    }

    pub fn var_nil(&self, v: Var) -> bool {
        self.var_state(v) == VarState::Nil
    }

    pub fn var_unseen_in_sup_comp(&self, v: Var) -> bool {
        self.var_state(v) == VarState::Unseen
    }

    pub fn var_seen(&self, v: Var) -> bool {
        self.var_state(v) == VarState::Seen
    }

    pub fn set_var_in_sup_comp_unseen(&mut self, v: Var) {
        self.set_var_state(v, VarState::Unseen);
    }

    pub fn set_var_seen(&mut self, v: Var) {
        self.set_var_state(v, VarState::Seen);
    }

    pub fn set_var_in_other_comp(&mut self, v: Var) {
        self.set_var_state(v, VarState::InOtherComp);
    }

    // Clause half.

    pub fn clause_state(&self, c: ClauseId) -> ClauseState {
        self.slots[c.index()].clause
    }

    pub fn set_clause_state(&mut self, c: ClauseId, state: ClauseState) {
        debug_assert!(!c.is_sentinel());
        self.slots[c.index()].clause = state;
    }

    pub fn clause_nil(&self, c: ClauseId) -> bool {
        self.clause_state(c) == ClauseState::Nil
    }

    pub fn clause_unseen_in_sup_comp(&self, c: ClauseId) -> bool {
        self.clause_state(c) == ClauseState::Unseen
    }

    pub fn clause_seen(&self, c: ClauseId) -> bool {
        matches!(self.clause_state(c), ClauseState::Seen { .. })
    }

    pub fn clause_all_lits_active(&self, c: ClauseId) -> bool {
        self.clause_state(c) == ClauseState::Seen { all_lits_active: true }
    }

    pub fn set_clause_in_sup_comp_unseen(&mut self, c: ClauseId) {
        self.set_clause_state(c, ClauseState::Unseen);
    }

    pub fn set_clause_nil(&mut self, c: ClauseId) {
        self.set_clause_state(c, ClauseState::Nil);
    }

    pub fn set_clause_seen(&mut self, c: ClauseId, all_lits_active: bool) {
        self.set_clause_state(c, ClauseState::Seen { all_lits_active });
    }

    pub fn set_clause_in_other_comp(&mut self, c: ClauseId) {
        self.set_clause_state(c, ClauseState::InOtherComp);
    }

    /// Packs every seen member of `super_comp` into a new component and its
    /// signature, and marks them as claimed.
    ///
    /// Members are emitted in super-component order. Clauses whose literals
    /// are all active go into the component but not into the signature.
    pub fn make_component_from_state(&mut self, super_comp: &Component) -> (Component, Signature) {
        let (_, bound_id) = self.binding.expect("Archetype is not bound to a super-component");
        assert_eq!(bound_id, super_comp.id(), "Archetype is bound to another super-component");

        let mut comp = Component::with_capacity(super_comp.num_variables(), super_comp.num_long_clauses());
        self.signature_buf.clear();

        for v in super_comp.vars() {
            if self.var_seen(v) {
                comp.add_var(v);
                self.signature_buf.push(v.id());
                self.set_var_in_other_comp(v);
            }
        }
        comp.close_variable_data();
        self.signature_buf.push(Var::SENTINEL.id());

        for c in super_comp.clauses() {
            if let ClauseState::Seen { all_lits_active } = self.clause_state(c) {
                comp.add_clause(c);
                if !all_lits_active {
                    self.signature_buf.push(c.id());
                }
                self.set_clause_in_other_comp(c);
            }
        }
        comp.close_clause_data();
        self.signature_buf.push(ClauseId::SENTINEL.id());

        let signature = Signature::from_packed(&self.signature_buf);
        (comp, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn bound(max_var: u32, max_clause: u32, super_comp: &Component) -> Archetype {
        let mut a = Archetype::new();
        a.init_arrays(Var::new(max_var), ClauseId::from_raw(max_clause));
        a.re_initialize(1, super_comp);
        a
    }

    #[test]
    fn test_slot_halves_are_independent() {
        let sup = Component::whole_formula(Var::new(3), ClauseId::new(3));
        let mut a = bound(3, 3, &sup);
        assert_eq!(a.num_slots(), 4);

        a.set_var_seen(Var::new(2));
        a.set_clause_in_sup_comp_unseen(ClauseId::new(2));
        assert!(a.var_seen(Var::new(2)));
        assert!(a.clause_unseen_in_sup_comp(ClauseId::new(2)));

        a.set_clause_nil(ClauseId::new(2));
        assert!(a.var_seen(Var::new(2)));
        assert_eq!(
            a.slot(2),
            Slot {
                var: VarState::Seen,
                clause: ClauseState::Nil
            }
        );
    }

    #[test]
    fn test_slots_sized_by_larger_id_space() {
        let mut a = Archetype::new();
        a.init_arrays(Var::new(2), ClauseId::new(7));
        assert_eq!(a.num_slots(), 8);
        a.init_arrays(Var::new(9), ClauseId::SENTINEL);
        assert_eq!(a.num_slots(), 10);
    }

    #[test]
    fn test_re_initialize_clears() {
        let sup = Component::whole_formula(Var::new(3), ClauseId::new(1));
        let mut a = bound(3, 1, &sup);
        a.set_var_in_other_comp(Var::new(1));
        a.set_clause_seen(ClauseId::new(1), true);
        a.re_initialize(2, &sup);
        assert!(a.var_nil(Var::new(1)));
        assert!(a.clause_nil(ClauseId::new(1)));
        assert_eq!(a.bound_stack_index(), Some(2));
    }

    #[test]
    fn test_make_component_from_state() {
        let sup = Component::whole_formula(Var::new(5), ClauseId::new(3));
        let mut a = bound(5, 3, &sup);

        for v in [1, 3, 4] {
            a.set_var_seen(Var::new(v));
        }
        a.set_var_in_sup_comp_unseen(Var::new(2));
        a.set_clause_seen(ClauseId::new(1), false);
        a.set_clause_seen(ClauseId::new(3), true);
        a.set_clause_in_sup_comp_unseen(ClauseId::new(2));

        let (comp, sig) = a.make_component_from_state(&sup);
        assert_eq!(comp.vars().map(Var::id).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(comp.clauses().map(ClauseId::id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(sig.as_words(), &[1, 3, 4, 0, 1, 0]);

        // Emitted members are claimed, the rest is untouched.
        assert_eq!(a.var_state(Var::new(3)), VarState::InOtherComp);
        assert_eq!(a.clause_state(ClauseId::new(3)), ClauseState::InOtherComp);
        assert!(a.var_unseen_in_sup_comp(Var::new(2)));
        assert!(a.clause_unseen_in_sup_comp(ClauseId::new(2)));
        assert!(a.var_nil(Var::new(5)));

        // A second sweep finds nothing new.
        let (empty, _) = a.make_component_from_state(&sup);
        assert!(empty.is_empty());
    }

    #[test]
    #[should_panic(expected = "Archetype is bound to another super-component")]
    fn test_binding_mismatch() {
        let sup = Component::whole_formula(Var::new(2), ClauseId::SENTINEL);
        let mut a = bound(2, 0, &sup);
        let mut other = Component::whole_formula(Var::new(2), ClauseId::SENTINEL);
        other.set_id(CacheEntryId::new(5));
        a.make_component_from_state(&other);
    }
}
