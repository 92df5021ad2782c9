//! Ontomap saturation engine
//!
//! This crate turns a set of hand-written mappings (each mapping a
//! relational query to a class or property of an ontology vocabulary),
//! the ontology's subsumption hierarchy and the database's foreign-key
//! constraints into a complete, minimized set of per-entity query
//! definitions — the *T-mapping* — ready for translation to SQL.
//!
//! The pipeline, leaves first:
//!
//! - [`homomorphism`]: incremental extension of a partial variable
//!   assignment with constant/structure compatibility checks.
//! - [`chase`]: closure of a set of extensional atoms under non-nullable
//!   foreign keys, introducing fresh variables (labelled nulls) for
//!   unknown referenced values.
//! - [`containment`]: conjunctive-query containment under inclusion
//!   dependencies via the classical chase-then-homomorphism test, with a
//!   backtracking search over memoized fact closures.
//! - [`dag`] / [`ontology`]: the equivalence DAGs over ontology entities
//!   (consumed, not built here).
//! - [`algebra`] / [`levelup`]: relational-algebra query trees and their
//!   rewriters (union merging, null-key filtering, nested-view level-up).
//! - [`tmapping`]: the saturator that aggregates, minimizes and
//!   redistributes mapping rules along the DAGs.
//!
//! The engine is single-pass, in-memory and CPU-bound. All inputs are
//! immutable; the only shared mutable state is the containment checker's
//! closure memo, which is concurrency-safe so that the three entity
//! categories (classes, object properties, data properties) can be
//! saturated in parallel.

pub mod algebra;
pub mod chase;
pub mod containment;
pub mod dag;
pub mod exclusion;
pub mod homomorphism;
pub mod levelup;
pub mod ontology;
pub mod rule;
pub mod tmapping;

pub use algebra::{
    enforce_non_null, flatten_predicate, merge_definitions, Condition, Query, QueryNode,
};
pub use chase::ChaseEngine;
pub use containment::{
    ContainmentConfig, CqContainmentCheck, ExtensionalContainmentCheck,
    LinearInclusionDependencies, LinearInclusionDependency,
};
pub use dag::{Equivalences, EquivalencesDag};
pub use exclusion::TMappingExclusionConfig;
pub use homomorphism::HomomorphismBuilder;
pub use levelup::LevelUpOptimizer;
pub use ontology::{
    ClassExpression, ClassifiedTBox, DataPropertyExpression, ObjectPropertyExpression,
};
pub use rule::{MappingKey, TMappingRule};
pub use tmapping::{SaturatedMapping, TMappingSaturator};
