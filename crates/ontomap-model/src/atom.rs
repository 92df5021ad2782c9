//! Atoms: a predicate symbol applied to an ordered argument list.
//!
//! The same shape serves extensional atoms (predicate = relation name) and
//! Datalog-style atoms; extensional atoms are resolved against a
//! [`Catalog`](crate::schema::Catalog) when constraint metadata is needed.

use crate::substitution::Substitution;
use crate::term::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Atom {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Atom {
            predicate: predicate.into(),
            terms,
        }
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Variables of the atom, in positional order, with duplicates.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        for t in &self.terms {
            t.collect_variables(&mut out);
        }
        out
    }

    pub fn apply(&self, substitution: &Substitution) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            terms: self.terms.iter().map(|t| substitution.apply(t)).collect(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{t}")?;
        }
        write!(f, ")")
    }
}
