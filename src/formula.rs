//! Formula substrate consumed by the decomposition core.
//!
//! Clauses are split by length, the way propagation-oriented solvers store
//! them:
//!
//! - **unit** clauses are kept in a plain list,
//! - **binary** clauses become symmetric links between literals,
//! - **long** clauses (length >= 3) live in a single literal pool.
//!
//! # Literal pool layout
//!
//! ```text
//! [0] | hdr hdr hdr | l l l 0 | hdr hdr hdr | l l l l 0 | ...
//!       ^^^^^^^^^^^   ^
//!       header        ClauseOfs points at the first literal
//! ```
//!
//! Each long clause is preceded by [`CLAUSE_HEADER_OVERHEAD`] header slots
//! (clause id, length, reserved) and terminated by [`Lit::SENTINEL`].
//! Long clauses receive [`ClauseId`]s `1, 2, ...` in pool order.

use log::trace;

use crate::error::{FormulaError, FormulaResult};
use crate::types::{ClauseId, ClauseOfs, Lit, Var};

/// Number of literal-sized slots in front of every long clause.
pub const CLAUSE_HEADER_OVERHEAD: usize = 3;

/// Decoded clause header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClauseHeader {
    pub id: ClauseId,
    pub length: u32,
}

#[derive(Debug, Clone)]
pub struct Formula {
    num_vars: u32,
    literal_pool: Vec<Lit>,
    /// Indexed by [`ClauseId`]; slot 0 is unused.
    clause_offsets: Vec<ClauseOfs>,
    /// Literal-indexed partner lists of binary clauses.
    binary_links: Vec<Vec<Lit>>,
    unit_clauses: Vec<Lit>,
    num_binary_clauses: usize,
}

impl Formula {
    /// Creates an empty formula over variables `1..=num_vars`.
    pub fn new(num_vars: u32) -> Self {
        Self {
            num_vars,
            literal_pool: vec![Lit::SENTINEL],
            clause_offsets: vec![ClauseOfs::NONE],
            binary_links: vec![Vec::new(); 2 * (num_vars as usize + 1)],
            unit_clauses: Vec::new(),
            num_binary_clauses: 0,
        }
    }

    /// Builds a formula from DIMACS-style clauses.
    pub fn from_clauses<I, C>(num_vars: u32, clauses: I) -> FormulaResult<Self>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[i32]>,
    {
        let mut formula = Formula::new(num_vars);
        for clause in clauses {
            formula.add_clause(clause.as_ref())?;
        }
        Ok(formula)
    }

    /// Adds a clause given as DIMACS literals.
    ///
    /// Returns the [`ClauseId`] if the clause went into the long-clause pool.
    pub fn add_clause(&mut self, clause: &[i32]) -> FormulaResult<Option<ClauseId>> {
        let lits = self.validate(clause)?;

        match lits.len() {
            1 => {
                if !self.unit_clauses.contains(&lits[0]) {
                    self.unit_clauses.push(lits[0]);
                }
                Ok(None)
            }
            2 => {
                self.add_binary_clause(lits[0], lits[1]);
                Ok(None)
            }
            _ => Ok(Some(self.add_long_clause(&lits))),
        }
    }

    fn validate(&self, clause: &[i32]) -> FormulaResult<Vec<Lit>> {
        if clause.is_empty() {
            return Err(FormulaError::EmptyClause);
        }
        let mut lits: Vec<Lit> = Vec::with_capacity(clause.len());
        for &lit in clause {
            if lit == 0 {
                return Err(FormulaError::ZeroLiteral);
            }
            let var = lit.unsigned_abs();
            if var > self.num_vars {
                return Err(FormulaError::VariableOutOfRange {
                    lit,
                    var,
                    num_vars: self.num_vars,
                });
            }
            let lit = Lit::from_dimacs(lit);
            if lits.iter().any(|l| l.var() == lit.var()) {
                return Err(FormulaError::RepeatedVariable { var });
            }
            lits.push(lit);
        }
        Ok(lits)
    }

    fn add_binary_clause(&mut self, a: Lit, b: Lit) -> bool {
        if self.binary_links[a.index()].contains(&b) {
            return false;
        }
        self.binary_links[a.index()].push(b);
        self.binary_links[b.index()].push(a);
        self.num_binary_clauses += 1;
        true
    }

    fn add_long_clause(&mut self, lits: &[Lit]) -> ClauseId {
        let id = ClauseId::new(self.clause_offsets.len() as u32);

        self.literal_pool.push(Lit::from_raw(id.id()));
        self.literal_pool.push(Lit::from_raw(lits.len() as u32));
        self.literal_pool.push(Lit::SENTINEL);
        debug_assert_eq!(CLAUSE_HEADER_OVERHEAD, 3);

        let ofs = ClauseOfs::new(self.literal_pool.len() as u32);
        self.literal_pool.extend_from_slice(lits);
        self.literal_pool.push(Lit::SENTINEL);
        self.clause_offsets.push(ofs);

        trace!("add_long_clause: {} at offset {}", id, ofs.index());
        id
    }

    pub fn num_variables(&self) -> u32 {
        self.num_vars
    }

    pub fn max_variable_id(&self) -> Var {
        Var::from_raw(self.num_vars)
    }

    /// Id of the last long clause ([`ClauseId::SENTINEL`] if there is none).
    pub fn max_clause_id(&self) -> ClauseId {
        ClauseId::from_raw((self.clause_offsets.len() - 1) as u32)
    }

    pub fn num_long_clauses(&self) -> usize {
        self.clause_offsets.len() - 1
    }

    pub fn num_binary_clauses(&self) -> usize {
        self.num_binary_clauses
    }

    pub fn unit_clauses(&self) -> &[Lit] {
        &self.unit_clauses
    }

    /// Partners of `lit` in binary clauses `(lit ∨ other)`.
    pub fn binary_links(&self, lit: Lit) -> &[Lit] {
        &self.binary_links[lit.index()]
    }

    pub fn offset_of(&self, id: ClauseId) -> ClauseOfs {
        assert!(!id.is_sentinel() && id.index() < self.clause_offsets.len());
        self.clause_offsets[id.index()]
    }

    pub fn header_of(&self, ofs: ClauseOfs) -> ClauseHeader {
        let start = ofs.index() - CLAUSE_HEADER_OVERHEAD;
        ClauseHeader {
            id: ClauseId::from_raw(self.literal_pool[start].raw()),
            length: self.literal_pool[start + 1].raw(),
        }
    }

    /// Literals of the long clause starting at `ofs` (without the terminator).
    pub fn clause(&self, ofs: ClauseOfs) -> &[Lit] {
        let length = self.header_of(ofs).length as usize;
        &self.literal_pool[ofs.index()..ofs.index() + length]
    }

    /// Iterates over all long clauses in pool order.
    pub fn long_clauses(&self) -> impl Iterator<Item = (ClauseId, &[Lit])> + '_ {
        self.clause_offsets
            .iter()
            .skip(1)
            .map(move |&ofs| (self.header_of(ofs).id, self.clause(ofs)))
    }
}
