//! Type-safe identifiers for variables, literals, clauses and cache entries.
//!
//! Every identifier space reserves the raw value `0` as a sentinel meaning
//! "none". The spaces are deliberately distinct newtypes: a [`Var`] can never be
//! compared against a [`ClauseId`], even though both index the same scratch
//! array during decomposition.
use std::fmt;
use std::ops::Neg;

/// A variable identifier (1-indexed, `0` is the sentinel).
///
/// # Invariants
///
/// - Real variables are `>= 1`
/// - [`Var::SENTINEL`] terminates packed variable lists
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl Var {
    /// Terminator of packed variable lists.
    pub const SENTINEL: Var = Var(0);

    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Var(raw)
    }

    /// Returns the raw variable ID as a `u32`.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the variable ID as an array index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, true)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A literal, encoded as `(var << 1) | sign` where `sign == 1` is positive.
///
/// The encoding makes literals directly usable as indices into
/// literal-indexed arrays. [`Lit::SENTINEL`] (raw `0`) belongs to the
/// sentinel variable and terminates clauses in the literal pool.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const SENTINEL: Lit = Lit(0);

    pub fn new(var: Var, positive: bool) -> Self {
        Lit((var.0 << 1) | positive as u32)
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Lit(raw)
    }

    /// Converts a DIMACS literal (`-3` is "not x3").
    ///
    /// # Panics
    ///
    /// Panics if `lit == 0`.
    pub fn from_dimacs(lit: i32) -> Self {
        assert_ne!(lit, 0, "DIMACS literal must be non-zero");
        Lit::new(Var::new(lit.unsigned_abs()), lit > 0)
    }

    pub fn to_dimacs(self) -> i32 {
        let v = self.var().id() as i32;
        if self.is_positive() {
            v
        } else {
            -v
        }
    }

    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    pub const fn is_positive(self) -> bool {
        self.0 & 1 == 1
    }

    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }

    /// Return the internal representation of the literal.
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.is_positive() { "" } else { "~" }, self.var())
    }
}

/// Identifier of a clause of length >= 3 (1-indexed, pool order).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ClauseId(u32);

impl ClauseId {
    pub const SENTINEL: ClauseId = ClauseId(0);

    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Clause IDs must be >= 1");
        ClauseId(id)
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        ClauseId(raw)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Offset of a clause's first literal inside the literal pool.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ClauseOfs(u32);

impl ClauseOfs {
    pub const NONE: ClauseOfs = ClauseOfs(0);

    pub(crate) const fn new(ofs: u32) -> Self {
        ClauseOfs(ofs)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an entry in the component cache.
///
/// Ids are minted by the cache, never reused, and `0` means "no entry"
/// (e.g. the father of the root component).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct CacheEntryId(u32);

impl CacheEntryId {
    pub const NONE: CacheEntryId = CacheEntryId(0);

    pub(crate) const fn new(id: u32) -> Self {
        CacheEntryId(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CacheEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
