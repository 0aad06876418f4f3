//! Component manager: the decomposition interface of the search loop.
//!
//! The manager owns the component stack, shared by all open search nodes:
//!
//! ```text
//! index:  0       1       2 ...
//!         dummy   root    components of deeper nodes ...
//! ```
//!
//! A [`StackLevel`] points into the stack: its super-component and the slice
//! of components discovered for it. The slice is filled lazily, on the first
//! [`find_next_remaining_component_of`][ComponentManager::find_next_remaining_component_of]
//! for the node, and released on backtrack with
//! [`clean_remaining_components_of`][ComponentManager::clean_remaining_components_of].
//!
//! # Example
//!
//! ```
//! use decomp_rs::assignment::Assignment;
//! use decomp_rs::config::SolverConfig;
//! use decomp_rs::formula::Formula;
//! use decomp_rs::manager::ComponentManager;
//!
//! let formula = Formula::from_clauses(6, [[1, 2, 3], [4, 5, 6]]).unwrap();
//! let values = Assignment::new(6);
//!
//! let mut manager = ComponentManager::new(SolverConfig::default());
//! manager.initialize(&formula);
//!
//! let mut top = manager.root_level();
//! assert!(manager.find_next_remaining_component_of(&mut top, &values));
//! assert_eq!(manager.component_stack_size(), 4);
//! assert_eq!(manager.current_remaining_component_of(&top).num_variables(), 3);
//! ```

use log::{debug, trace};
use num_bigint::BigUint;

use crate::analyzer::ComponentAnalyzer;
use crate::archetype::Archetype;
use crate::assignment::Assignment;
use crate::cache::ComponentCache;
use crate::component::{Component, Signature};
use crate::config::SolverConfig;
use crate::formula::Formula;
use crate::stack::StackLevel;
use crate::types::Var;

pub struct ComponentManager {
    config: SolverConfig,
    analyzer: ComponentAnalyzer,
    archetype: Archetype,
    cache: ComponentCache,
    component_stack: Vec<Component>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl ComponentManager {
    pub fn new(config: SolverConfig) -> Self {
        let cache = ComponentCache::new(config.cache_table_bits);
        Self {
            config,
            analyzer: ComponentAnalyzer::new(),
            archetype: Archetype::new(),
            cache,
            component_stack: Vec::new(),
        }
    }

    /// Prepares decomposition of `formula`: builds the link pool, sizes the
    /// scratch state and pushes the whole formula as the root component.
    pub fn initialize(&mut self, formula: &Formula) {
        self.analyzer.initialize(formula, &mut self.archetype);

        let mut root = Component::whole_formula(formula.max_variable_id(), formula.max_clause_id());
        let signature = Signature::new(root.vars(), root.clauses());
        self.cache.init(&mut root, signature);

        self.component_stack.clear();
        self.component_stack.push(Component::default());
        self.component_stack.push(root);

        debug!(
            "initialize: {} variables, {} long clauses, {} link words",
            formula.num_variables(),
            formula.num_long_clauses(),
            self.analyzer.links().num_words()
        );
    }

    /// Search node for the root component.
    pub fn root_level(&self) -> StackLevel {
        assert_eq!(self.component_stack.len(), 2, "Manager is not freshly initialized");
        StackLevel::new(1, 2)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &ComponentCache {
        &self.cache
    }

    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Branching weight of `v`.
    pub fn score_of(&self, v: Var) -> u32 {
        self.analyzer.score_of(v)
    }

    pub fn component_stack_size(&self) -> usize {
        self.component_stack.len()
    }

    pub fn component(&self, stack_index: usize) -> &Component {
        assert!(stack_index < self.component_stack.len(), "Stack index {} out of bounds", stack_index);
        &self.component_stack[stack_index]
    }

    pub fn super_component_of(&self, top: &StackLevel) -> &Component {
        assert!(self.component_stack.len() > top.super_component());
        &self.component_stack[top.super_component()]
    }

    pub fn current_remaining_component_of(&self, top: &StackLevel) -> &Component {
        let index = top.current_remaining_component();
        assert!(self.component_stack.len() > index);
        &self.component_stack[index]
    }

    /// Attaches a computed count to the component at `stack_index`.
    /// Does nothing with caching disabled.
    pub fn cache_model_count_of(&mut self, stack_index: usize, value: BigUint) {
        if self.config.perform_component_caching {
            let id = self.component(stack_index).id();
            self.cache.store_value_of(id, value);
        }
    }

    /// Checks whether `top` has a component left to solve, enumerating the
    /// components of the node on the first call.
    ///
    /// Returns `false` once all components are processed; the node is then
    /// counted as satisfiable with factor 1, unless a cached zero made it unsat.
    pub fn find_next_remaining_component_of(&mut self, top: &mut StackLevel, values: &Assignment) -> bool {
        assert!(!top.branch_found_unsat());

        if self.component_stack.len() <= top.remaining_components_ofs() {
            self.record_remaining_comps_for(top, values);
        }
        if top.branch_found_unsat() {
            return false;
        }
        if top.has_unprocessed_components() {
            return true;
        }
        top.include_solution(1u32);
        false
    }

    /// Splits the super-component of `top` into its components.
    ///
    /// Cache hits are folded into `top`; misses are pushed on the stack with a
    /// fresh cache id, then the new slice is sorted.
    pub fn record_remaining_comps_for(&mut self, top: &mut StackLevel, values: &Assignment) {
        let Self {
            config,
            analyzer,
            archetype,
            cache,
            component_stack,
        } = self;

        assert!(component_stack.len() > top.super_component());
        let super_comp = &component_stack[top.super_component()];
        let new_comps_start_ofs = component_stack.len();

        analyzer.setup_analysis_context(archetype, top, super_comp, values);

        let mut found: Vec<Component> = Vec::new();
        let mut hits = 0;
        for v in super_comp.vars() {
            if !analyzer.is_unseen_and_active(archetype, v, values)
                || !analyzer.explore_remaining_comp_of(archetype, top, v, values)
            {
                continue;
            }
            let (mut comp, signature) = archetype.make_component_from_state(super_comp);
            if config.perform_component_caching && cache.manage_new_component(top, &signature) {
                trace!("record_remaining_comps_for: cache hit, {} variables", comp.num_variables());
                hits += 1;
                continue;
            }
            comp.set_id(cache.store_as_entry(signature, super_comp.id()));
            trace!(
                "record_remaining_comps_for: new component {} with {} variables, {} clauses",
                comp.id(),
                comp.num_variables(),
                comp.num_long_clauses()
            );
            found.push(comp);
        }

        debug!(
            "record_remaining_comps_for: super {} ({} vars) -> {} new, {} cached",
            super_comp.id(),
            super_comp.num_variables(),
            found.len(),
            hits
        );

        component_stack.extend(found);
        top.set_unprocessed_components_end(component_stack.len());
        let end = component_stack.len();
        self.sort_component_stack_range(new_comps_start_ofs, end);
    }

    /// Orders the stack range by variable count, largest first.
    pub fn sort_component_stack_range(&mut self, start: usize, end: usize) {
        assert!(start <= end && end <= self.component_stack.len());
        let comps = &mut self.component_stack[start..end];

        match comps.len() {
            0 | 1 => {}
            2 => {
                if comps[0].num_variables() < comps[1].num_variables() {
                    comps.swap(0, 1);
                }
            }
            n => {
                for i in 0..n {
                    for j in i + 1..n {
                        if comps[i].num_variables() < comps[j].num_variables() {
                            comps.swap(i, j);
                        }
                    }
                }
            }
        }
    }

    /// Pops every component of `top` and flags its cache entry deletable.
    pub fn clean_remaining_components_of(&mut self, top: &StackLevel) {
        while self.component_stack.len() > top.remaining_components_ofs() {
            if let Some(comp) = self.component_stack.pop() {
                if self.cache.has_entry(comp.id()) {
                    self.cache.set_deletable(comp.id());
                }
            }
        }
        assert!(top.remaining_components_ofs() <= self.component_stack.len());
    }

    /// Erases the cache subtrees of all components of `top`.
    ///
    /// Used when a node is abandoned with some of its components solved and
    /// others not: entries recorded below them describe an inconsistent state.
    pub fn remove_all_cache_pollutions_of(&mut self, top: &StackLevel) {
        assert!(top.remaining_components_ofs() <= self.component_stack.len());
        assert_ne!(top.super_component(), 0);
        assert!(self.cache.has_entry(self.super_component_of(top).id()));

        for comp in &self.component_stack[top.remaining_components_ofs()..] {
            if self.cache.has_entry(comp.id()) {
                self.cache.clean_pollutions_involving(comp.id());
            }
        }
    }

    /// Recomputes and returns the memory estimate of the cache.
    pub fn recompute_memory_usage(&mut self) -> usize {
        self.cache.recompute_bytes_memory_usage()
    }

    /// Runs cache eviction rounds until the estimate fits the configured
    /// budget or nothing is deletable. Returns the number of erased entries.
    pub fn evict_cache_if_needed(&mut self) -> usize {
        let mut erased = 0;
        while self.cache.recompute_bytes_memory_usage() > self.config.maximum_cache_size_bytes {
            let n = self.cache.delete_entries();
            if n == 0 {
                break;
            }
            erased += n;
        }
        if erased > 0 {
            debug!(
                "evict_cache_if_needed: erased {} entries, {} bytes in use",
                erased,
                self.cache.bytes_memory_usage()
            );
        }
        erased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::types::{ClauseId, Lit};

    fn manager_for(num_vars: u32, clauses: &[&[i32]], config: SolverConfig) -> ComponentManager {
        let formula = Formula::from_clauses(num_vars, clauses).unwrap();
        let mut manager = ComponentManager::new(config);
        manager.initialize(&formula);
        manager
    }

    fn var_ids(comp: &Component) -> Vec<u32> {
        comp.vars().map(Var::id).collect()
    }

    #[test]
    fn test_initialize() {
        let manager = manager_for(4, &[&[1, 2, 3], &[2, 3, 4]], SolverConfig::default());
        assert_eq!(manager.component_stack_size(), 2);
        let root = manager.component(1);
        assert_eq!(var_ids(root), vec![1, 2, 3, 4]);
        assert_eq!(root.num_long_clauses(), 2);
        assert_eq!(root.id(), manager.cache().root_id());
        assert!(manager.component(0).is_empty());

        let top = manager.root_level();
        assert_eq!(top.super_component(), 1);
        assert_eq!(top.remaining_components_ofs(), 2);
    }

    #[test]
    fn test_sorted_largest_first() {
        let manager_clauses: &[&[i32]] = &[&[1, 2], &[3, 4, 5], &[6, 7, 8, 9], &[7, 10]];
        let mut manager = manager_for(10, manager_clauses, SolverConfig::default());
        let values = Assignment::new(10);
        let mut top = manager.root_level();

        assert!(manager.find_next_remaining_component_of(&mut top, &values));
        let sizes: Vec<usize> = (2..manager.component_stack_size())
            .map(|i| manager.component(i).num_variables())
            .collect();
        assert_eq!(sizes, vec![5, 3, 2]);
        // The cursor starts at the end of the range.
        assert_eq!(manager.current_remaining_component_of(&top).num_variables(), 2);
    }

    #[test]
    fn test_sort_two_and_many() {
        let mut manager = manager_for(3, &[&[1, 2, 3]], SolverConfig::default());
        let small = Component::from_parts([Var::new(1)], std::iter::empty());
        let big = Component::from_parts([1, 2, 3].map(Var::new), [ClauseId::new(1)]);
        let mid = Component::from_parts([1, 2].map(Var::new), std::iter::empty());

        manager.component_stack.extend([small.clone(), big.clone()]);
        manager.sort_component_stack_range(2, 4);
        assert_eq!(manager.component(2).num_variables(), 3);

        manager.component_stack.truncate(2);
        manager.component_stack.extend([small, mid, big.clone(), big]);
        manager.sort_component_stack_range(2, 6);
        let sizes: Vec<usize> = (2..6).map(|i| manager.component(i).num_variables()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 1]);

        // Empty range.
        manager.sort_component_stack_range(6, 6);
    }

    #[test]
    fn test_no_components_counts_one() {
        let mut manager = manager_for(2, &[&[1, 2]], SolverConfig::default());
        let mut values = Assignment::new(2);
        values.assign(Lit::from_dimacs(1));
        values.assign(Lit::from_dimacs(2));

        let mut top = manager.root_level();
        assert!(!manager.find_next_remaining_component_of(&mut top, &values));
        assert_eq!(top.total_model_count(), BigUint::from(1u32));
    }

    #[test]
    fn test_free_variables_are_trivial() {
        let mut manager = manager_for(3, &[&[1, 2, 3]], SolverConfig::default());
        let mut values = Assignment::new(3);
        values.assign(Lit::from_dimacs(1));

        let mut top = manager.root_level();
        assert!(!manager.find_next_remaining_component_of(&mut top, &values));
        assert_eq!(manager.component_stack_size(), 2);
        assert_eq!(top.total_model_count(), BigUint::from(4u32));
    }

    #[test]
    fn test_clean_remaining_marks_deletable() {
        let mut manager = manager_for(6, &[&[1, 2, 3], &[4, 5, 6]], SolverConfig::default());
        let values = Assignment::new(6);
        let mut top = manager.root_level();
        assert!(manager.find_next_remaining_component_of(&mut top, &values));

        let ids: Vec<_> = (2..4).map(|i| manager.component(i).id()).collect();
        manager.clean_remaining_components_of(&top);
        assert_eq!(manager.component_stack_size(), 2);
        for id in ids {
            assert!(manager.cache().entry(id).is_deletable());
        }
        assert!(!manager.cache().entry(manager.cache().root_id()).is_deletable());
    }

    #[test]
    fn test_remove_pollutions() {
        let mut manager = manager_for(6, &[&[1, 2, 3], &[4, 5, 6]], SolverConfig::default());
        let values = Assignment::new(6);
        let mut top = manager.root_level();
        assert!(manager.find_next_remaining_component_of(&mut top, &values));

        let ids: Vec<_> = (2..4).map(|i| manager.component(i).id()).collect();
        manager.remove_all_cache_pollutions_of(&top);
        for id in ids {
            assert!(!manager.cache().has_entry(id));
        }
        assert_eq!(manager.cache().num_entries(), 1);
        manager.clean_remaining_components_of(&top);
        assert_eq!(manager.component_stack_size(), 2);
    }

    #[test]
    fn test_caching_disabled() {
        let config = SolverConfig::default().with_caching(false);
        let mut manager = manager_for(6, &[&[1, 2, 3], &[4, 5, 6]], config);
        let values = Assignment::new(6);

        let mut top = manager.root_level();
        assert!(manager.find_next_remaining_component_of(&mut top, &values));
        let index = top.current_remaining_component();
        manager.cache_model_count_of(index, BigUint::from(7u32));
        assert!(!manager.cache().entry(manager.component(index).id()).model_count_found());

        // Ids are still minted.
        assert_eq!(manager.cache().num_entries(), 3);
        assert_eq!(manager.cache().lookups(), 0);
    }

    #[test]
    fn test_evict_cache_if_needed() {
        let config = SolverConfig::default().with_maximum_cache_size(0);
        let mut manager = manager_for(6, &[&[1, 2, 3], &[4, 5, 6]], config);
        let values = Assignment::new(6);

        let mut top = manager.root_level();
        assert!(manager.find_next_remaining_component_of(&mut top, &values));
        // Nothing is deletable while the components are on the stack.
        assert_eq!(manager.evict_cache_if_needed(), 0);

        manager.clean_remaining_components_of(&top);
        assert_eq!(manager.evict_cache_if_needed(), 2);
        assert_eq!(manager.cache().num_entries(), 1);
    }
}
