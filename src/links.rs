//! Flattened occurrence lists used by the connectivity analyzer.
//!
//! All adjacency data lives in one contiguous `u32` pool, built once per
//! formula. Each variable owns a run with three sections:
//!
//! ```text
//! offsets[v]
//!   │
//!   ▼
//!   w w w 0 │ c a b  c a b  0 │ c r  c r  0 │ l l 0  l l l 0
//!   binary  │ ternary triples │ long pairs  │ literal runs of long clauses
//! ```
//!
//! - **binary**: neighbour variables from binary clauses,
//! - **ternary**: `(clause, lit, lit)` with the two *other* literals inline,
//! - **long**: `(clause, r)` where the clause's other literals start `r + 1`
//!   words past the `r` word, i.e. in the literal runs that follow the section.
//!
//! The layout is never read by hand outside this module: [`LinkIter`] walks a
//! run and yields a tagged [`Link`] per step.

use crate::formula::Formula;
use crate::types::{ClauseId, Lit, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Link<'a> {
    Binary(Var),
    Ternary { clause: ClauseId, lits: [Lit; 2] },
    Long { clause: ClauseId, lits: ClauseLits<'a> },
}

/// The literals of a long clause other than the visiting variable's own.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClauseLits<'a>(&'a [u32]);

impl<'a> ClauseLits<'a> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Lit {
        Lit::from_raw(self.0[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = Lit> + 'a {
        self.0.iter().map(|&raw| Lit::from_raw(raw))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinkPool {
    pool: Vec<u32>,
    /// Variable-indexed start of each run.
    offsets: Vec<usize>,
}

impl LinkPool {
    pub fn build(formula: &Formula) -> Self {
        let n = formula.num_variables() as usize;

        let mut ternary: Vec<Vec<u32>> = vec![Vec::new(); n + 1];
        let mut long_pairs: Vec<Vec<(ClauseId, u32)>> = vec![Vec::new(); n + 1];
        let mut long_lits: Vec<Vec<u32>> = vec![Vec::new(); n + 1];

        for (clause, lits) in formula.long_clauses() {
            for lit in lits {
                let v = lit.var().index();
                let others = lits.iter().filter(|l| l.var() != lit.var()).map(|l| l.raw());
                if lits.len() == 3 {
                    ternary[v].push(clause.id());
                    ternary[v].extend(others);
                } else {
                    long_pairs[v].push((clause, long_lits[v].len() as u32));
                    long_lits[v].extend(others);
                    long_lits[v].push(Lit::SENTINEL.raw());
                }
            }
        }

        // Offset 0 is never a valid run start.
        let mut pool: Vec<u32> = vec![0, 0];
        let mut offsets = vec![0; n + 1];

        for v in 1..=n {
            let var = Var::new(v as u32);
            offsets[v] = pool.len();

            for lit in [var.neg(), var.pos()] {
                pool.extend(formula.binary_links(lit).iter().map(|l| l.var().id()));
            }
            pool.push(Var::SENTINEL.id());

            pool.extend_from_slice(&ternary[v]);
            pool.push(ClauseId::SENTINEL.id());

            let k = long_pairs[v].len();
            for (i, &(clause, ofs)) in long_pairs[v].iter().enumerate() {
                pool.push(clause.id());
                // Distance from the offset word to the first word after the
                // section terminator, plus the clause's place in the literal runs.
                pool.push(ofs + (2 * (k - i)) as u32);
            }
            pool.push(ClauseId::SENTINEL.id());

            pool.extend_from_slice(&long_lits[v]);
        }

        Self { pool, offsets }
    }

    pub fn links_of(&self, var: Var) -> LinkIter<'_> {
        debug_assert!(!var.is_sentinel() && var.index() < self.offsets.len());
        LinkIter {
            pool: &self.pool,
            pos: self.offsets[var.index()],
            section: Section::Binary,
        }
    }

    /// Number of `u32` words in the pool, including the two leading pads.
    pub fn num_words(&self) -> usize {
        self.pool.len()
    }

    /// Number of variables with a run.
    pub fn num_variables(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Section {
    Binary,
    Ternary,
    Long,
    Done,
}

pub struct LinkIter<'a> {
    pool: &'a [u32],
    pos: usize,
    section: Section,
}

impl<'a> Iterator for LinkIter<'a> {
    type Item = Link<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.section {
                Section::Binary => {
                    let word = self.pool[self.pos];
                    self.pos += 1;
                    if word == 0 {
                        self.section = Section::Ternary;
                        continue;
                    }
                    return Some(Link::Binary(Var::from_raw(word)));
                }
                Section::Ternary => {
                    let word = self.pool[self.pos];
                    if word == 0 {
                        self.pos += 1;
                        self.section = Section::Long;
                        continue;
                    }
                    let link = Link::Ternary {
                        clause: ClauseId::from_raw(word),
                        lits: [
                            Lit::from_raw(self.pool[self.pos + 1]),
                            Lit::from_raw(self.pool[self.pos + 2]),
                        ],
                    };
                    self.pos += 3;
                    return Some(link);
                }
                Section::Long => {
                    let word = self.pool[self.pos];
                    if word == 0 {
                        self.section = Section::Done;
                        return None;
                    }
                    let start = self.pos + 1 + self.pool[self.pos + 1] as usize;
                    let mut end = start;
                    while self.pool[end] != 0 {
                        end += 1;
                    }
                    self.pos += 2;
                    return Some(Link::Long {
                        clause: ClauseId::from_raw(word),
                        lits: ClauseLits(&self.pool[start..end]),
                    });
                }
                Section::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn dimacs(lits: ClauseLits<'_>) -> Vec<i32> {
        lits.iter().map(Lit::to_dimacs).collect()
    }

    #[test]
    fn test_sections() {
        let mut f = Formula::new(6);
        f.add_clause(&[1, -2]).unwrap();
        f.add_clause(&[-1, 3]).unwrap();
        f.add_clause(&[1, 4, -5]).unwrap(); // c1, ternary
        f.add_clause(&[2, -1, 5, 6]).unwrap(); // c2, long
        f.add_clause(&[-6, 1, 3, 4, 2]).unwrap(); // c3, long

        let pool = LinkPool::build(&f);
        let links: Vec<Link<'_>> = pool.links_of(Var::new(1)).collect();
        assert_eq!(links.len(), 5);

        // Negative links first, then positive.
        assert_eq!(links[0], Link::Binary(Var::new(3)));
        assert_eq!(links[1], Link::Binary(Var::new(2)));
        assert_eq!(
            links[2],
            Link::Ternary {
                clause: ClauseId::new(1),
                lits: [Lit::from_dimacs(4), Lit::from_dimacs(-5)],
            }
        );
        match links[3] {
            Link::Long { clause, lits } => {
                assert_eq!(clause, ClauseId::new(2));
                assert_eq!(dimacs(lits), vec![2, 5, 6]);
            }
            other => panic!("unexpected link {:?}", other),
        }
        match links[4] {
            Link::Long { clause, lits } => {
                assert_eq!(clause, ClauseId::new(3));
                assert_eq!(dimacs(lits), vec![-6, 3, 4, 2]);
                assert_eq!(lits.len(), 4);
                assert_eq!(lits.get(1), Lit::from_dimacs(3));
            }
            other => panic!("unexpected link {:?}", other),
        }
    }

    #[test]
    fn test_isolated_variable() {
        let mut f = Formula::new(4);
        f.add_clause(&[1, 2, 3]).unwrap();

        let pool = LinkPool::build(&f);
        assert_eq!(pool.links_of(Var::new(4)).count(), 0);
        assert_eq!(pool.links_of(Var::new(2)).count(), 1);
    }

    #[test]
    fn test_sizes() {
        let pool = LinkPool::build(&Formula::new(0));
        assert_eq!(pool.num_variables(), 0);
        assert_eq!(pool.num_words(), 2);

        // Three empty section terminators per variable.
        let pool = LinkPool::build(&Formula::new(3));
        assert_eq!(pool.num_variables(), 3);
        assert_eq!(pool.num_words(), 2 + 3 * 3);
    }

    #[test]
    fn test_every_occurrence_is_linked() {
        let mut f = Formula::new(5);
        f.add_clause(&[1, 2, 3, 4]).unwrap();
        f.add_clause(&[-1, -2, -3, -4, -5]).unwrap();
        f.add_clause(&[2, 5, -4]).unwrap();

        let pool = LinkPool::build(&f);
        for v in 1..=5 {
            let var = Var::new(v);
            for link in pool.links_of(var) {
                let (clause, others): (ClauseId, Vec<Lit>) = match link {
                    Link::Binary(_) => unreachable!(),
                    Link::Ternary { clause, lits } => (clause, lits.to_vec()),
                    Link::Long { clause, lits } => (clause, lits.iter().collect()),
                };
                let full = f.clause(f.offset_of(clause));
                assert_eq!(others.len() + 1, full.len());
                assert!(others.iter().all(|l| l.var() != var));
                assert!(others.iter().all(|l| full.contains(l)));
            }
        }
    }
}
