//! Errors raised while building a [`Formula`][crate::formula::Formula].
//!
//! Decomposition itself has no recoverable failures: broken internal
//! contracts (bad stack indices, mismatched scratch bindings) are defects and
//! panic. Only clause input coming from outside the crate is validated.

use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty clause")]
    EmptyClause,

    #[error("literal 0 is reserved as the clause terminator")]
    ZeroLiteral,

    #[error("literal {lit} refers to variable {var}, but the formula has only {num_vars} variables")]
    VariableOutOfRange { lit: i32, var: u32, num_vars: u32 },

    #[error("variable {var} occurs more than once in a clause")]
    RepeatedVariable { var: u32 },
}

pub type FormulaResult<T> = Result<T, FormulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = FormulaError::VariableOutOfRange {
            lit: -5,
            var: 5,
            num_vars: 3,
        };
        assert_eq!(
            e.to_string(),
            "literal -5 refers to variable 5, but the formula has only 3 variables"
        );
        assert_eq!(
            FormulaError::RepeatedVariable { var: 2 }.to_string(),
            "variable 2 occurs more than once in a clause"
        );
    }
}
