//! Ontomap model types
//!
//! This crate defines the immutable building blocks shared by the mapping
//! compiler:
//!
//! - **Terms** (variables, constants, functional terms) and **atoms**
//!   (predicate + ordered argument list), with structural equality.
//! - **Substitutions**: finite `Variable -> Term` maps with composition,
//!   union (conflict-checked) and injective fresh renaming.
//! - **Variable generators**: the only stateful piece; always passed
//!   explicitly, never implied globally.
//! - **Relational schema metadata**: relations with per-attribute
//!   nullability, foreign keys and nested-view lineage — the integrity
//!   constraints the chase and the containment checkers reason over.
//!
//! Everything here is created during mapping/ontology loading and is
//! immutable afterwards; the engine crate only reads these values.

pub mod atom;
pub mod error;
pub mod generator;
pub mod iri;
pub mod schema;
pub mod substitution;
pub mod term;

pub use atom::Atom;
pub use error::MappingError;
pub use generator::VariableGenerator;
pub use iri::Iri;
pub use schema::{Attribute, Catalog, ForeignKey, RelationDefinition, RelationKind};
pub use substitution::Substitution;
pub use term::{Constant, ConstantType, Term, Variable};
