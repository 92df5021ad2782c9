//! Compilation-failure error surface.
//!
//! Two classes of failure, both non-recoverable within the compiler:
//!
//! - configuration errors (cyclic foreign keys, head arity mismatches,
//!   unknown relations) that the user fixes by correcting mapping or
//!   schema metadata, and
//! - internal invariant violations, which signal a bug in the compiler
//!   itself and abort the current pass.
//!
//! Ordinary negative outcomes (containment fails, no homomorphism found,
//! empty rule set) are values, never errors.

use crate::term::{Term, Variable};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("substitution union conflict on {variable}: {left} vs {right}")]
    SubstitutionConflict {
        variable: Variable,
        left: Term,
        right: Term,
    },

    #[error("rule head arity mismatch for {entity}: expected {expected}, got {actual}")]
    HeadArityMismatch {
        entity: String,
        expected: usize,
        actual: usize,
    },

    #[error("cyclic foreign key chain through relation {relation}")]
    CyclicForeignKeys { relation: String },

    #[error("unknown relation {0}")]
    UnknownRelation(String),

    #[error("malformed exclusion declaration at line {line}: {text}")]
    InvalidExclusionConfig { line: usize, text: String },

    #[error("atom over {relation} has {actual} arguments, relation has arity {expected}")]
    AtomArityMismatch {
        relation: String,
        expected: usize,
        actual: usize,
    },

    /// Invariant violation inside the compiler. Not a user error.
    #[error("internal error: {0}")]
    Internal(String),
}
