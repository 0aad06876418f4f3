//! Search-node bookkeeping shared between the search loop and the manager.
//!
//! A [`StackLevel`] refers to the component stack only through indices:
//!
//! ```text
//! component stack: [ ... | super | ... | r r r r r ]
//!                          ^             ^         ^
//!                          super_comp    ofs       end
//! ```
//!
//! The entries in `remaining_components_ofs..unprocessed_components_end` are
//! the still-unsolved components of the node; the cursor consumes them from
//! the end.

use num_bigint::BigUint;
use num_traits::Zero;

#[derive(Debug, Clone)]
pub struct StackLevel {
    super_component: usize,
    remaining_components_ofs: usize,
    unprocessed_components_end: usize,
    active_branch: usize,
    /// Zero means "not set yet" until the branch is marked unsat.
    branch_model_count: [BigUint; 2],
    branch_found_unsat: [bool; 2],
}

impl StackLevel {
    pub fn new(super_component: usize, comp_stack_ofs: usize) -> Self {
        Self {
            super_component,
            remaining_components_ofs: comp_stack_ofs,
            unprocessed_components_end: comp_stack_ofs,
            active_branch: 0,
            branch_model_count: [BigUint::zero(), BigUint::zero()],
            branch_found_unsat: [false, false],
        }
    }

    pub fn super_component(&self) -> usize {
        self.super_component
    }

    /// Watermark: stack entries at or above it belong to this node.
    pub fn remaining_components_ofs(&self) -> usize {
        self.remaining_components_ofs
    }

    pub fn unprocessed_components_end(&self) -> usize {
        self.unprocessed_components_end
    }

    pub fn set_unprocessed_components_end(&mut self, end: usize) {
        assert!(end >= self.remaining_components_ofs);
        self.unprocessed_components_end = end;
    }

    pub fn has_unprocessed_components(&self) -> bool {
        debug_assert!(self.unprocessed_components_end >= self.remaining_components_ofs);
        self.unprocessed_components_end > self.remaining_components_ofs
    }

    pub fn next_unprocessed_component(&mut self) {
        assert!(self.has_unprocessed_components());
        self.unprocessed_components_end -= 1;
    }

    pub fn reset_remaining_comps(&mut self) {
        self.unprocessed_components_end = self.remaining_components_ofs;
    }

    /// Stack index of the component the cursor points at.
    pub fn current_remaining_component(&self) -> usize {
        assert!(self.has_unprocessed_components(), "No remaining component");
        self.unprocessed_components_end - 1
    }

    pub fn another_comp_processible(&self) -> bool {
        !self.branch_found_unsat() && self.has_unprocessed_components()
    }

    pub fn is_second_branch(&self) -> bool {
        self.active_branch == 1
    }

    pub fn change_branch(&mut self) {
        assert!(!self.is_second_branch(), "Already on the second branch");
        self.active_branch = 1;
    }

    pub fn branch_found_unsat(&self) -> bool {
        self.branch_found_unsat[self.active_branch]
    }

    /// Marks the active branch unsat, dropping whatever it had counted.
    pub fn mark_branch_unsat(&mut self) {
        self.branch_found_unsat[self.active_branch] = true;
        self.branch_model_count[self.active_branch].set_zero();
    }

    pub fn branch_model_count(&self, branch: usize) -> &BigUint {
        &self.branch_model_count[branch]
    }

    /// Multiplies the active branch count by `solutions`.
    ///
    /// The first factor of a branch is stored as is. A zero factor marks the
    /// branch unsat, after which further factors are ignored.
    pub fn include_solution(&mut self, solutions: impl Into<BigUint>) {
        let solutions = solutions.into();
        let b = self.active_branch;
        if self.branch_found_unsat[b] {
            debug_assert!(self.branch_model_count[b].is_zero());
            return;
        }
        if solutions.is_zero() {
            self.branch_found_unsat[b] = true;
        }
        if self.branch_model_count[b].is_zero() {
            self.branch_model_count[b] = solutions;
        } else {
            self.branch_model_count[b] *= solutions;
        }
    }

    pub fn total_model_count(&self) -> BigUint {
        &self.branch_model_count[0] + &self.branch_model_count[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_cursor() {
        let mut top = StackLevel::new(1, 4);
        assert!(!top.has_unprocessed_components());

        top.set_unprocessed_components_end(7);
        assert_eq!(top.current_remaining_component(), 6);
        top.next_unprocessed_component();
        assert_eq!(top.current_remaining_component(), 5);
        assert!(top.another_comp_processible());

        top.reset_remaining_comps();
        assert!(!top.has_unprocessed_components());
        assert_eq!(top.remaining_components_ofs(), 4);
    }

    #[test]
    fn test_include_solution() {
        let mut top = StackLevel::new(1, 2);
        top.include_solution(3u32);
        top.include_solution(4u32);
        assert_eq!(top.branch_model_count(0), &BigUint::from(12u32));

        top.change_branch();
        assert!(top.is_second_branch());
        top.include_solution(5u32);
        assert_eq!(top.total_model_count(), BigUint::from(17u32));
    }

    #[test]
    fn test_zero_freezes_branch() {
        let mut top = StackLevel::new(1, 2);
        top.include_solution(2u32);
        top.include_solution(0u32);
        assert!(top.branch_found_unsat());
        top.include_solution(9u32);
        assert!(top.branch_model_count(0).is_zero());

        top.change_branch();
        assert!(!top.branch_found_unsat());
        top.include_solution(6u32);
        top.mark_branch_unsat();
        assert!(!top.another_comp_processible());
        assert!(top.total_model_count().is_zero());
    }
}
