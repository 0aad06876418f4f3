#![allow(dead_code)]

use num_bigint::BigUint;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use decomp_rs::assignment::Assignment;
use decomp_rs::config::SolverConfig;
use decomp_rs::formula::Formula;
use decomp_rs::manager::ComponentManager;
use decomp_rs::stack::StackLevel;
use decomp_rs::types::{Lit, Var};

/// Random CNF with clauses of length `2..=max_len` over distinct variables.
pub fn random_cnf(num_vars: u32, num_clauses: usize, max_len: usize, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..num_clauses)
        .map(|_| {
            let len = rng.random_range(2..=max_len.min(num_vars as usize));
            rand::seq::index::sample(&mut rng, num_vars as usize, len)
                .into_iter()
                .map(|i| {
                    let v = i as i32 + 1;
                    if rng.random_bool(0.5) {
                        v
                    } else {
                        -v
                    }
                })
                .collect()
        })
        .collect()
}

pub fn brute_force_count(num_vars: u32, clauses: &[Vec<i32>]) -> BigUint {
    let mut count = 0u64;
    for bits in 0u64..(1 << num_vars) {
        let value = |lit: i32| {
            let bit = (bits >> (lit.unsigned_abs() - 1)) & 1 == 1;
            if lit > 0 {
                bit
            } else {
                !bit
            }
        };
        if clauses.iter().all(|c| c.iter().any(|&l| value(l))) {
            count += 1;
        }
    }
    BigUint::from(count)
}

/// Model counter driving the manager the way a search loop does:
/// branch on the best-scored variable, propagate, decompose, recurse.
pub struct Counter {
    clauses: Vec<Vec<Lit>>,
    manager: ComponentManager,
    values: Assignment,
    trail: Vec<Var>,
    evict: bool,
    lowest_var_first: bool,
}

impl Counter {
    pub fn new(num_vars: u32, clauses: &[Vec<i32>], config: SolverConfig) -> Self {
        let formula = Formula::from_clauses(num_vars, clauses).unwrap();
        let mut manager = ComponentManager::new(config);
        manager.initialize(&formula);
        Self {
            clauses: clauses
                .iter()
                .map(|c| c.iter().map(|&l| Lit::from_dimacs(l)).collect())
                .collect(),
            manager,
            values: Assignment::new(num_vars),
            trail: Vec::new(),
            evict: false,
            lowest_var_first: false,
        }
    }

    /// Runs cache eviction after every solved component.
    pub fn with_eviction(mut self) -> Self {
        self.evict = true;
        self
    }

    /// Branches on the smallest variable id instead of the best score.
    pub fn with_lowest_var_first(mut self) -> Self {
        self.lowest_var_first = true;
        self
    }

    pub fn manager(&self) -> &ComponentManager {
        &self.manager
    }

    pub fn count(&mut self) -> BigUint {
        if !self.propagate() {
            return BigUint::from(0u32);
        }
        let mut top = self.manager.root_level();
        self.solve_components_of(&mut top);
        top.total_model_count()
    }

    fn solve_components_of(&mut self, top: &mut StackLevel) {
        while self.manager.find_next_remaining_component_of(top, &self.values) {
            let index = top.current_remaining_component();
            let count = self.count_component(index);
            self.manager.cache_model_count_of(index, count.clone());
            top.include_solution(count);
            top.next_unprocessed_component();
            if self.evict {
                self.manager.evict_cache_if_needed();
            }
            if top.branch_found_unsat() {
                self.manager.remove_all_cache_pollutions_of(top);
                break;
            }
        }
    }

    fn count_component(&mut self, index: usize) -> BigUint {
        let comp = self.manager.component(index);
        let var = if self.lowest_var_first {
            comp.vars().min()
        } else {
            comp.vars().max_by_key(|&v| self.manager.score_of(v))
        }
        .expect("components are never empty");

        let mut level = StackLevel::new(index, self.manager.component_stack_size());
        for lit in [var.pos(), var.neg()] {
            if lit == var.neg() {
                level.change_branch();
            }
            let mark = self.trail.len();
            self.assign(lit);
            if self.propagate() {
                self.solve_components_of(&mut level);
            } else {
                level.mark_branch_unsat();
            }
            self.manager.clean_remaining_components_of(&level);
            level.reset_remaining_comps();
            self.backtrack(mark);
        }
        level.total_model_count()
    }

    fn assign(&mut self, lit: Lit) {
        self.values.assign(lit);
        self.trail.push(lit.var());
    }

    fn backtrack(&mut self, mark: usize) {
        for v in self.trail.drain(mark..) {
            self.values.unassign(v);
        }
    }

    /// Naive unit propagation to fixpoint. Returns `false` on conflict.
    fn propagate(&mut self) -> bool {
        loop {
            let mut changed = false;
            for i in 0..self.clauses.len() {
                let clause = &self.clauses[i];
                if clause.iter().any(|&l| self.values.is_satisfied(l)) {
                    continue;
                }
                let mut active = clause.iter().copied().filter(|&l| self.values.is_active(l));
                let first = active.next();
                let second = active.next();
                match (first, second) {
                    (None, _) => return false,
                    (Some(unit), None) => {
                        self.assign(unit);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }
}

/// Ids of the components currently on the stack at or above `ofs`,
/// as sorted `(variables, long clauses)` pairs.
pub fn components_above(manager: &ComponentManager, ofs: usize) -> Vec<(Vec<u32>, Vec<u32>)> {
    let mut parts: Vec<(Vec<u32>, Vec<u32>)> = (ofs..manager.component_stack_size())
        .map(|i| {
            let comp = manager.component(i);
            let mut vars: Vec<u32> = comp.vars().map(|v| v.id()).collect();
            let mut clauses: Vec<u32> = comp.clauses().map(|c| c.id()).collect();
            vars.sort_unstable();
            clauses.sort_unstable();
            (vars, clauses)
        })
        .collect();
    parts.sort();
    parts
}
