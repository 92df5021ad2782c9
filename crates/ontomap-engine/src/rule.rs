//! Mapping rules: one disjunct of an ontology entity's query definition.
//!
//! A rule pairs a conjunctive body over the relational schema with a head
//! argument list: `[subject]` for class-membership rules, `[subject,
//! object]` for property rules. Head terms are typically IRI templates
//! (functional terms) over body variables. Rules for the same key form a
//! disjunctive (unioned) definition of the entity's extension.

use ontomap_model::{Atom, Iri, MappingError, Term, Variable};
use serde::{Deserialize, Serialize};

/// Index key of a rule set. All mappings here target triple-shaped
/// predicates; named-graph (quad) mappings are out of scope, so the
/// predicate arity class is folded into `is_class`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappingKey {
    pub iri: Iri,
    pub is_class: bool,
}

impl MappingKey {
    pub fn class(iri: impl Into<Iri>) -> Self {
        MappingKey {
            iri: iri.into(),
            is_class: true,
        }
    }

    pub fn property(iri: impl Into<Iri>) -> Self {
        MappingKey {
            iri: iri.into(),
            is_class: false,
        }
    }

    pub fn head_arity(&self) -> usize {
        if self.is_class {
            1
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TMappingRule {
    key: MappingKey,
    head: Vec<Term>,
    body: Vec<Atom>,
}

impl TMappingRule {
    /// Checks the head against the key's expected arity; a mismatch is a
    /// wiring bug, not a data problem.
    pub fn new(key: MappingKey, head: Vec<Term>, body: Vec<Atom>) -> Result<Self, MappingError> {
        if head.len() != key.head_arity() {
            return Err(MappingError::HeadArityMismatch {
                entity: key.iri.to_string(),
                expected: key.head_arity(),
                actual: head.len(),
            });
        }
        Ok(TMappingRule { key, head, body })
    }

    pub fn class_rule(
        iri: impl Into<Iri>,
        subject: Term,
        body: Vec<Atom>,
    ) -> Result<Self, MappingError> {
        Self::new(MappingKey::class(iri), vec![subject], body)
    }

    pub fn property_rule(
        iri: impl Into<Iri>,
        subject: Term,
        object: Term,
        body: Vec<Atom>,
    ) -> Result<Self, MappingError> {
        Self::new(MappingKey::property(iri), vec![subject, object], body)
    }

    pub fn key(&self) -> &MappingKey {
        &self.key
    }

    pub fn iri(&self) -> &Iri {
        &self.key.iri
    }

    pub fn head(&self) -> &[Term] {
        &self.head
    }

    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    pub fn with_body(&self, body: Vec<Atom>) -> Self {
        TMappingRule {
            key: self.key.clone(),
            head: self.head.clone(),
            body,
        }
    }

    /// Distinct variables of the head, in first-occurrence order.
    pub fn head_variables(&self) -> Vec<&Variable> {
        let mut seen = Vec::new();
        for term in &self.head {
            for v in term.variables() {
                if !seen.contains(&v) {
                    seen.push(v);
                }
            }
        }
        seen
    }
}
