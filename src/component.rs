//! Components and their cache signatures.
//!
//! A [`Component`] is a connected sub-formula: a set of variables and the long
//! clauses among them. Both lists are packed into one buffer, each terminated
//! by the `0` sentinel:
//!
//! ```text
//! data = [ v1 v2 ... vk 0 | c1 c2 ... cm 0 ]
//!                          ^ clauses_ofs
//! ```
//!
//! A [`Signature`] uses the same packing but omits every clause whose literals
//! are all still active: such a clause is fully determined by the variable set
//! (all of its variables are members), so listing it adds nothing to the key.

use std::mem::size_of;

use crate::types::{CacheEntryId, ClauseId, Var};
use crate::utils::{hash_words, MyHash};

#[derive(Debug, Clone)]
pub struct Component {
    id: CacheEntryId,
    data: Vec<u32>,
    /// Start of the clause list; `0` while the variable list is still open.
    clauses_ofs: usize,
}

impl Default for Component {
    fn default() -> Self {
        Component::from_parts(std::iter::empty(), std::iter::empty())
    }
}

impl Component {
    /// Creates an open component with room for the given member counts.
    ///
    /// Fill it with [`add_var`][Self::add_var],
    /// [`close_variable_data`][Self::close_variable_data],
    /// [`add_clause`][Self::add_clause] and
    /// [`close_clause_data`][Self::close_clause_data], in this order.
    pub fn with_capacity(num_vars: usize, num_clauses: usize) -> Self {
        Self {
            id: CacheEntryId::NONE,
            data: Vec::with_capacity(num_vars + num_clauses + 2),
            clauses_ofs: 0,
        }
    }

    pub fn from_parts(
        vars: impl IntoIterator<Item = Var>,
        clauses: impl IntoIterator<Item = ClauseId>,
    ) -> Self {
        let mut comp = Component::with_capacity(0, 0);
        for v in vars {
            comp.add_var(v);
        }
        comp.close_variable_data();
        for c in clauses {
            comp.add_clause(c);
        }
        comp.close_clause_data();
        comp
    }

    /// The component holding every variable and every long clause.
    pub fn whole_formula(max_var: Var, max_clause: ClauseId) -> Self {
        Component::from_parts(
            (1..=max_var.id()).map(Var::new),
            (1..=max_clause.id()).map(ClauseId::new),
        )
    }

    pub fn id(&self) -> CacheEntryId {
        self.id
    }

    pub fn set_id(&mut self, id: CacheEntryId) {
        self.id = id;
    }

    pub fn add_var(&mut self, var: Var) {
        debug_assert!(!var.is_sentinel());
        debug_assert_eq!(self.clauses_ofs, 0, "variable list already closed");
        self.data.push(var.id());
    }

    pub fn close_variable_data(&mut self) {
        self.data.push(Var::SENTINEL.id());
        self.clauses_ofs = self.data.len();
    }

    pub fn add_clause(&mut self, clause: ClauseId) {
        debug_assert!(!clause.is_sentinel());
        debug_assert_ne!(self.clauses_ofs, 0, "variable list still open");
        self.data.push(clause.id());
    }

    pub fn close_clause_data(&mut self) {
        self.data.push(ClauseId::SENTINEL.id());
    }

    pub fn num_variables(&self) -> usize {
        debug_assert_ne!(self.clauses_ofs, 0);
        self.clauses_ofs - 1
    }

    pub fn num_long_clauses(&self) -> usize {
        self.data.len() - self.clauses_ofs - 1
    }

    pub fn is_empty(&self) -> bool {
        self.num_variables() == 0
    }

    pub fn var_at(&self, i: usize) -> Var {
        assert!(i < self.num_variables());
        Var::from_raw(self.data[i])
    }

    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.data[..self.clauses_ofs - 1].iter().map(|&v| Var::from_raw(v))
    }

    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.data[self.clauses_ofs..self.data.len() - 1]
            .iter()
            .map(|&c| ClauseId::from_raw(c))
    }

    pub fn contains_var(&self, var: Var) -> bool {
        self.vars().any(|v| v == var)
    }
}

/// Canonical, hashable encoding of a component, used as the cache key.
///
/// Two signatures are equal iff their variable lists and their lists of
/// not-all-active clauses are equal.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Signature {
    data: Box<[u32]>,
}

impl Signature {
    pub(crate) fn from_packed(data: &[u32]) -> Self {
        debug_assert_eq!(data.iter().filter(|&&w| w == 0).count(), 2);
        debug_assert_eq!(data.last(), Some(&0));
        Self { data: data.into() }
    }

    pub fn new(
        vars: impl IntoIterator<Item = Var>,
        clauses: impl IntoIterator<Item = ClauseId>,
    ) -> Self {
        let mut data: Vec<u32> = vars.into_iter().map(Var::id).collect();
        data.push(Var::SENTINEL.id());
        data.extend(clauses.into_iter().map(ClauseId::id));
        data.push(ClauseId::SENTINEL.id());
        Self { data: data.into() }
    }

    /// Builds the signature of `comp`, omitting clauses for which
    /// `all_lits_active` holds.
    pub fn of_component(comp: &Component, all_lits_active: impl Fn(ClauseId) -> bool) -> Self {
        Signature::new(comp.vars(), comp.clauses().filter(|&c| !all_lits_active(c)))
    }

    pub fn num_variables(&self) -> usize {
        self.data.iter().position(|&w| w == 0).unwrap_or(0)
    }

    pub fn num_clauses(&self) -> usize {
        self.data.len() - self.num_variables() - 2
    }

    pub fn as_words(&self) -> &[u32] {
        &self.data
    }

    /// Heap plus inline footprint.
    pub fn size_in_bytes(&self) -> usize {
        size_of::<Self>() + self.data.len() * size_of::<u32>()
    }
}

impl MyHash for Signature {
    fn hash(&self) -> u64 {
        hash_words(&self.data)
    }
}
