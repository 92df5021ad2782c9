//! Incremental homomorphism construction.
//!
//! A builder extends a partial variable assignment one term pair at a
//! time, checking constant and structure compatibility as it goes. A
//! failed extension marks the builder invalid for good; callers clone
//! before attempting a branch, so failed attempts never corrupt the state
//! a backtracking search returns to.

use ahash::AHashMap;
use ontomap_model::{Atom, Substitution, Term, Variable};

#[derive(Debug, Clone)]
pub struct HomomorphismBuilder {
    map: AHashMap<Variable, Term>,
    valid: bool,
}

impl Default for HomomorphismBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HomomorphismBuilder {
    pub fn new() -> Self {
        HomomorphismBuilder {
            map: AHashMap::new(),
            valid: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Extends the assignment with `from -> to`. Returns whether the
    /// extension is consistent; on failure the builder stays invalid.
    pub fn extend(&mut self, from: &Term, to: &Term) -> bool {
        if !self.valid {
            return false;
        }
        match from {
            Term::Variable(v) => match self.map.get(v) {
                Some(bound) if bound == to => true,
                Some(_) => self.fail(),
                None => {
                    self.map.insert(v.clone(), to.clone());
                    true
                }
            },
            Term::Constant(_) => {
                if from == to {
                    true
                } else {
                    self.fail()
                }
            }
            Term::Functional { symbol, args } => match to {
                Term::Functional {
                    symbol: to_symbol,
                    args: to_args,
                } if symbol == to_symbol && args.len() == to_args.len() => {
                    self.extend_all(args, to_args)
                }
                _ => self.fail(),
            },
        }
    }

    /// Extends position-wise over two equal-length term lists.
    pub fn extend_all(&mut self, from: &[Term], to: &[Term]) -> bool {
        debug_assert_eq!(from.len(), to.len());
        for (f, t) in from.iter().zip(to) {
            if !self.extend(f, t) {
                return false;
            }
        }
        true
    }

    /// Extends over two atoms; fails outright on predicate or arity
    /// mismatch.
    pub fn extend_atom(&mut self, from: &Atom, to: &Atom) -> bool {
        if from.predicate != to.predicate || from.arity() != to.arity() {
            return self.fail();
        }
        self.extend_all(&from.terms, &to.terms)
    }

    pub fn build(self) -> Substitution {
        debug_assert!(self.valid);
        Substitution::new(self.map)
    }

    fn fail(&mut self) -> bool {
        self.valid = false;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_variable_binds() {
        let mut b = HomomorphismBuilder::new();
        assert!(b.extend(&Term::var("x"), &Term::literal("1")));
        assert!(b.is_valid());
        let s = b.build();
        assert_eq!(s.apply_var(&Variable::new("x")), Term::literal("1"));
    }

    #[test]
    fn bound_variable_requires_consistency() {
        let mut b = HomomorphismBuilder::new();
        assert!(b.extend(&Term::var("x"), &Term::literal("1")));
        assert!(b.extend(&Term::var("x"), &Term::literal("1")));
        assert!(!b.extend(&Term::var("x"), &Term::literal("2")));
        assert!(!b.is_valid());
    }

    #[test]
    fn constants_must_match_literally() {
        let mut b = HomomorphismBuilder::new();
        assert!(!b.extend(&Term::literal("1"), &Term::literal("2")));
        let mut b = HomomorphismBuilder::new();
        // an IRI and a literal with the same lexical value differ
        assert!(!b.extend(&Term::iri("a"), &Term::literal("a")));
    }

    #[test]
    fn functional_terms_extend_recursively() {
        let from = Term::functional("uri", vec![Term::var("x"), Term::var("y")]);
        let to = Term::functional("uri", vec![Term::literal("1"), Term::var("z")]);
        let mut b = HomomorphismBuilder::new();
        assert!(b.extend(&from, &to));
        let s = b.build();
        assert_eq!(s.apply_var(&Variable::new("x")), Term::literal("1"));
        assert_eq!(s.apply_var(&Variable::new("y")), Term::var("z"));
    }

    #[test]
    fn functional_symbol_mismatch_fails() {
        let from = Term::functional("uri", vec![Term::var("x")]);
        let to = Term::functional("bnode", vec![Term::var("x")]);
        let mut b = HomomorphismBuilder::new();
        assert!(!b.extend(&from, &to));
    }

    #[test]
    fn failed_builder_rejects_everything() {
        let mut b = HomomorphismBuilder::new();
        assert!(!b.extend(&Term::literal("1"), &Term::literal("2")));
        assert!(!b.extend(&Term::var("x"), &Term::literal("1")));
    }
}
