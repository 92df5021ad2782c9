//! Immutable substitutions over terms.
//!
//! A substitution is a finite map `Variable -> Term` that never contains an
//! identity entry (`x -> x` is filtered on construction). Outside its domain
//! it behaves as the identity.

use crate::error::MappingError;
use crate::generator::VariableGenerator;
use crate::term::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    map: BTreeMap<Variable, Term>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a substitution from entries, dropping identity entries.
    pub fn new(entries: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        let map = entries
            .into_iter()
            .filter(|(v, t)| !matches!(t, Term::Variable(tv) if tv == v))
            .collect();
        Substitution { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, v: &Variable) -> Option<&Term> {
        self.map.get(v)
    }

    pub fn domain(&self) -> impl Iterator<Item = &Variable> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.map.iter()
    }

    /// The image of `v`, with identity fallback.
    pub fn apply_var(&self, v: &Variable) -> Term {
        self.map
            .get(v)
            .cloned()
            .unwrap_or_else(|| Term::Variable(v.clone()))
    }

    /// Applies the substitution throughout a term.
    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => self.apply_var(v),
            Term::Constant(_) => term.clone(),
            Term::Functional { symbol, args } => Term::Functional {
                symbol: symbol.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
            },
        }
    }

    /// Composition `g ∘ f`: `(g ∘ f)(x) = g(f(x))`, with identity fallback
    /// on both sides. The domain is `dom(f) ∪ dom(g)`.
    pub fn compose(g: &Substitution, f: &Substitution) -> Substitution {
        let mut entries: Vec<(Variable, Term)> = f
            .map
            .iter()
            .map(|(v, t)| (v.clone(), g.apply(t)))
            .collect();
        for (v, t) in &g.map {
            if !f.map.contains_key(v) {
                entries.push((v.clone(), t.clone()));
            }
        }
        Substitution::new(entries)
    }

    /// Merges two substitutions. Disagreement on a shared variable is a
    /// contract violation, reported rather than silently resolved.
    pub fn union(s1: &Substitution, s2: &Substitution) -> Result<Substitution, MappingError> {
        let mut map = s1.map.clone();
        for (v, t) in &s2.map {
            match map.get(v) {
                Some(existing) if existing != t => {
                    return Err(MappingError::SubstitutionConflict {
                        variable: v.clone(),
                        left: existing.clone(),
                        right: t.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    map.insert(v.clone(), t.clone());
                }
            }
        }
        Ok(Substitution { map })
    }

    /// Maps each variable to a freshly generated, pairwise-distinct variable.
    ///
    /// The variables themselves are registered with the generator first, so
    /// a fresh name can collide neither with them nor with anything the
    /// generator has issued before: injectivity holds by construction.
    pub fn injective_renaming<'a>(
        vars: impl IntoIterator<Item = &'a Variable>,
        gen: &mut VariableGenerator,
    ) -> Substitution {
        let vars: Vec<&Variable> = vars.into_iter().collect();
        gen.register(vars.iter().copied());
        let map = vars
            .into_iter()
            .map(|v| (v.clone(), Term::Variable(gen.fresh_from(v))))
            .collect();
        Substitution { map }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (v, t)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}/{t}")?;
        }
        write!(f, "}}")
    }
}
