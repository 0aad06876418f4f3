//! Tri-valued partial assignment over literals.
//!
//! The assignment is literal-indexed and redundant: assigning a literal also
//! records the opposite value for its negation, so every predicate is a
//! single array read.

use crate::types::{Lit, Var};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TriValue {
    False,
    True,
    #[default]
    Unassigned,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    values: Vec<TriValue>,
}

impl Assignment {
    /// Creates an assignment for variables `1..=num_vars`, all unassigned.
    pub fn new(num_vars: u32) -> Self {
        Self {
            values: vec![TriValue::Unassigned; 2 * (num_vars as usize + 1)],
        }
    }

    pub fn num_variables(&self) -> u32 {
        (self.values.len() / 2 - 1) as u32
    }

    pub fn value(&self, lit: Lit) -> TriValue {
        self.values[lit.index()]
    }

    /// Makes `lit` true (and its negation false).
    pub fn assign(&mut self, lit: Lit) {
        self.values[lit.index()] = TriValue::True;
        self.values[(-lit).index()] = TriValue::False;
    }

    pub fn unassign(&mut self, var: Var) {
        self.values[var.pos().index()] = TriValue::Unassigned;
        self.values[var.neg().index()] = TriValue::Unassigned;
    }

    /// The literal has not been assigned yet.
    #[inline]
    pub fn is_active(&self, lit: Lit) -> bool {
        self.values[lit.index()] == TriValue::Unassigned
    }

    /// The literal is assigned `true`.
    #[inline]
    pub fn is_satisfied(&self, lit: Lit) -> bool {
        self.values[lit.index()] == TriValue::True
    }

    /// The literal is assigned `false`.
    #[inline]
    pub fn is_resolved(&self, lit: Lit) -> bool {
        self.values[lit.index()] == TriValue::False
    }

    #[inline]
    pub fn is_var_active(&self, var: Var) -> bool {
        self.is_active(var.pos())
    }

    /// Iterates over the currently unassigned variables.
    pub fn active_vars(&self) -> impl Iterator<Item = Var> + '_ {
        (1..=self.num_variables())
            .map(Var::new)
            .filter(|&v| self.is_var_active(v))
    }
}
