//! Ontology entity expressions, as the classifier hands them over.
//!
//! Classes, object properties (possibly inverse) and data properties each
//! live in their own equivalence DAG; a class DAG may additionally contain
//! existential restrictions (`∃R`, `∃U`) as structural nodes — those carry
//! class-subsumption information but are never populated with their own
//! mapping definitions.

use crate::dag::EquivalencesDag;
use ontomap_model::Iri;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPropertyExpression {
    iri: Iri,
    inverse: bool,
}

impl ObjectPropertyExpression {
    pub fn new(iri: impl Into<Iri>) -> Self {
        ObjectPropertyExpression {
            iri: iri.into(),
            inverse: false,
        }
    }

    pub fn inverse_of(iri: impl Into<Iri>) -> Self {
        ObjectPropertyExpression {
            iri: iri.into(),
            inverse: true,
        }
    }

    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPropertyExpression {
    iri: Iri,
}

impl DataPropertyExpression {
    pub fn new(iri: impl Into<Iri>) -> Self {
        DataPropertyExpression { iri: iri.into() }
    }

    pub fn iri(&self) -> &Iri {
        &self.iri
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassExpression {
    /// A named class.
    Class(Iri),
    /// `∃R` — the domain of an object property (range, when inverse).
    ObjectSomeValuesFrom(ObjectPropertyExpression),
    /// `∃U` — the domain of a data property.
    DataSomeValuesFrom(DataPropertyExpression),
}

impl ClassExpression {
    /// The IRI whose mapping rules define this expression's extension.
    pub fn iri(&self) -> &Iri {
        match self {
            ClassExpression::Class(iri) => iri,
            ClassExpression::ObjectSomeValuesFrom(p) => p.iri(),
            ClassExpression::DataSomeValuesFrom(p) => p.iri(),
        }
    }

    pub fn is_named_class(&self) -> bool {
        matches!(self, ClassExpression::Class(_))
    }
}

/// The classified subsumption hierarchy: one DAG per entity category.
/// The three DAGs share no entities and are saturated independently.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedTBox {
    pub classes: EquivalencesDag<ClassExpression>,
    pub object_properties: EquivalencesDag<ObjectPropertyExpression>,
    pub data_properties: EquivalencesDag<DataPropertyExpression>,
}
