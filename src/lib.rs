//! # decomp-rs: Component Decomposition and Caching for #SAT
//!
//! **`decomp-rs`** is the decomposition core of a model counter.
//! Given a CNF formula under a partial assignment, it splits the still-active part of the formula into
//! independent sub-formulas (*components*), and recognizes components that were already solved elsewhere
//! in the search, so that their model count can be reused.
//!
//! ## Why Components?
//!
//! If a formula `F` splits into variable-disjoint parts `F1` and `F2`, then `#F = #F1 · #F2`.
//! A counter that branches on variables and decomposes after every decision solves many small
//! problems instead of one big one, and the same small problems show up again and again in different
//! branches. Caching their counts is what makes such counters fast.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: The search loop talks to a single [`ComponentManager`][crate::manager::ComponentManager],
//!   which owns the component stack, the connectivity analyzer and the cache.
//! - **Flat Adjacency**: Occurrence lists of all variables live in one contiguous pool, walked through a typed [`Link`][crate::links::Link] iterator.
//! - **Exact Signatures**: Components are cached by a packed [`Signature`][crate::component::Signature] of their variables and reduced clauses.
//! - **Arbitrary Precision**: Model counts are [`BigUint`][num_bigint::BigUint]s.
//! - **1-Based Indexing**: Variables and clauses are 1-indexed (reserving 0 as a sentinel), just like in DIMACS.
//!
//! ## Basic Usage
//!
//! ```rust
//! use decomp_rs::assignment::Assignment;
//! use decomp_rs::formula::Formula;
//! use decomp_rs::manager::ComponentManager;
//! use decomp_rs::types::Lit;
//!
//! // 1. Build a formula: (x1 ∨ x2 ∨ x3) ∧ (x3 ∨ x4 ∨ x5)
//! let formula = Formula::from_clauses(5, [[1, 2, 3], [3, 4, 5]]).unwrap();
//!
//! // 2. Initialize the manager
//! let mut manager = ComponentManager::default();
//! manager.initialize(&formula);
//!
//! // 3. Decide x3 = false: the formula falls apart into two components
//! let mut values = Assignment::new(5);
//! values.assign(Lit::from_dimacs(-3));
//!
//! let mut top = manager.root_level();
//! assert!(manager.find_next_remaining_component_of(&mut top, &values));
//! assert_eq!(manager.component_stack_size() - top.remaining_components_ofs(), 2);
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: The [`ComponentManager`][crate::manager::ComponentManager], entry point for the search loop.
//! - **[`analyzer`]**: Connectivity analysis and variable frequency scores.
//! - **[`cache`]**: The component cache.
//! - **[`formula`]** and **[`assignment`]**: The formula substrate being decomposed.

pub mod analyzer;
pub mod archetype;
pub mod assignment;
pub mod cache;
pub mod component;
pub mod config;
pub mod error;
pub mod formula;
pub mod links;
pub mod manager;
pub mod stack;
pub mod types;
pub mod utils;
