//! Relational schema metadata: the integrity constraints the chase and the
//! containment checkers reason over.
//!
//! A relation carries per-attribute nullability and its outgoing foreign
//! keys. A *nested view* is a relation derived by flattening an array
//! column of a parent relation; the level-up optimizer rewrites queries
//! over nested views back onto their parents.

use crate::error::MappingError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub nullable: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, nullable: bool) -> Self {
        Attribute {
            name: name.into(),
            nullable,
        }
    }
}

/// One component of a foreign key: the local attribute position and the
/// position it references in the target relation (both zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyComponent {
    pub local: usize,
    pub referenced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub components: Vec<ForeignKeyComponent>,
    pub referenced_relation: String,
}

impl ForeignKey {
    pub fn new(
        components: impl IntoIterator<Item = (usize, usize)>,
        referenced_relation: impl Into<String>,
    ) -> Self {
        ForeignKey {
            components: components
                .into_iter()
                .map(|(local, referenced)| ForeignKeyComponent { local, referenced })
                .collect(),
            referenced_relation: referenced_relation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    BaseTable,
    /// Derived by flattening the array column at `flattened_position` of
    /// `parent`. One row of the view per element of the array.
    NestedView {
        parent: String,
        flattened_position: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub foreign_keys: Vec<ForeignKey>,
    pub kind: RelationKind,
}

impl RelationDefinition {
    pub fn table(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        RelationDefinition {
            name: name.into(),
            attributes,
            foreign_keys: Vec::new(),
            kind: RelationKind::BaseTable,
        }
    }

    pub fn nested_view(
        name: impl Into<String>,
        attributes: Vec<Attribute>,
        parent: impl Into<String>,
        flattened_position: usize,
    ) -> Self {
        RelationDefinition {
            name: name.into(),
            attributes,
            foreign_keys: Vec::new(),
            kind: RelationKind::NestedView {
                parent: parent.into(),
                flattened_position,
            },
        }
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// A foreign key implies the referenced row only when every local
    /// column is non-nullable; a nullable column permits the referencing
    /// row to have no counterpart.
    pub fn fk_is_certain(&self, fk: &ForeignKey) -> bool {
        fk.components
            .iter()
            .all(|c| !self.attributes[c.local].nullable)
    }
}

/// The set of relations known to one compilation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    relations: AHashMap<String, RelationDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relation: RelationDefinition) {
        self.relations.insert(relation.name.clone(), relation);
    }

    pub fn relation(&self, name: &str) -> Result<&RelationDefinition, MappingError> {
        self.relations
            .get(name)
            .ok_or_else(|| MappingError::UnknownRelation(name.to_owned()))
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationDefinition> {
        self.relations.values()
    }

    /// Rejects cyclic foreign-key chains. The chase assumes an acyclic FK
    /// graph; a cycle would make it loop indefinitely, so it is a fatal
    /// configuration error, detected up front.
    pub fn validate_acyclic_foreign_keys(&self) -> Result<(), MappingError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }
        fn visit(
            catalog: &Catalog,
            name: &str,
            marks: &mut AHashMap<String, Mark>,
        ) -> Result<(), MappingError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    return Err(MappingError::CyclicForeignKeys {
                        relation: name.to_owned(),
                    });
                }
                None => {}
            }
            marks.insert(name.to_owned(), Mark::InProgress);
            if let Ok(rel) = catalog.relation(name) {
                for fk in &rel.foreign_keys {
                    visit(catalog, &fk.referenced_relation, marks)?;
                }
            }
            marks.insert(name.to_owned(), Mark::Done);
            Ok(())
        }

        let mut marks = AHashMap::new();
        for name in self.relations.keys() {
            visit(self, name, &mut marks)?;
        }
        Ok(())
    }
}
