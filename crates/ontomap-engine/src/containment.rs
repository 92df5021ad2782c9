//! Conjunctive-query containment under inclusion dependencies.
//!
//! Both checkers realize the classical chase-then-homomorphism test:
//! `query1 ⊆ query2` holds iff there is a homomorphism mapping `query2`'s
//! body into the chased closure of `query1`'s body that aligns the answer
//! tuples. Soundness rests on the chase asserting only atoms implied with
//! certainty (non-nullable foreign keys).
//!
//! The search is a backtracking walk over `body2`'s atoms with an explicit
//! choice-point stack — no call-stack recursion, so long bodies cannot
//! overflow it. Candidates are grouped by predicate for O(1) lookup, and a
//! cheap necessary condition (every predicate of `body2` occurs in the
//! closure) prunes before the search starts.
//!
//! Two variants share the machinery:
//!
//! - [`ExtensionalContainmentCheck`] works on raw relation atoms and
//!   chases through the catalog's foreign keys on demand;
//! - [`CqContainmentCheck`] works on Datalog-style bodies under *linear
//!   inclusion dependencies* and keeps its closures in a concurrent memo,
//!   because the same reference body is checked against many candidates
//!   during saturation, possibly from several worker threads.

use crate::chase::ChaseEngine;
use crate::homomorphism::HomomorphismBuilder;
use ahash::AHashMap;
use dashmap::DashMap;
use ontomap_model::{Atom, Catalog, MappingError, Substitution, Term, VariableGenerator};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;

/// Closure atoms grouped by predicate symbol.
type FactMap = AHashMap<String, Vec<Atom>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContainmentConfig {
    /// Upper bound on homomorphism extension attempts per containment
    /// check. Exhaustion is reported as "not proven contained", which is
    /// sound for minimization (a redundant rule is merely kept).
    pub max_search_steps: usize,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        ContainmentConfig {
            max_search_steps: 100_000,
        }
    }
}

fn group_by_predicate(atoms: Vec<Atom>) -> FactMap {
    let mut map: FactMap = AHashMap::new();
    for atom in atoms {
        map.entry(atom.predicate.clone()).or_default().push(atom);
    }
    map
}

fn all_predicates_present(body: &[Atom], facts: &FactMap) -> bool {
    body.iter().all(|a| facts.contains_key(&a.predicate))
}

/// Extends `seed` into a homomorphism mapping every atom of `from` onto
/// some fact, backtracking over candidate choices. Existential: the first
/// complete match wins.
fn some_homomorphism(
    seed: HomomorphismBuilder,
    from: &[Atom],
    facts: &FactMap,
    max_steps: usize,
) -> Option<Substitution> {
    if from.is_empty() {
        return Some(seed.build());
    }

    const NO_CANDIDATES: &Vec<Atom> = &Vec::new();
    let candidates_of =
        |atom: &Atom| -> &Vec<Atom> { facts.get(&atom.predicate).unwrap_or(NO_CANDIDATES) };

    let mut steps = 0usize;
    let mut parents: Vec<HomomorphismBuilder> = Vec::new();
    let mut current = seed;
    // untried candidates per choice point, initialized lazily
    let mut choices: Vec<Vec<&Atom>> = Vec::with_capacity(from.len());
    let mut index: usize = 0;

    loop {
        if index >= choices.len() {
            choices.push(candidates_of(&from[index]).iter().collect());
        }

        let mut advanced = false;
        while let Some(candidate) = choices[index].pop() {
            steps += 1;
            if steps > max_steps {
                tracing::warn!(
                    max_steps,
                    atoms = from.len(),
                    "containment search budget exhausted; treating as not contained"
                );
                return None;
            }
            let mut next = current.clone();
            if next.extend_atom(&from[index], candidate) {
                if index == from.len() - 1 {
                    return Some(next.build());
                }
                parents.push(current);
                current = next;
                index += 1;
                advanced = true;
                break;
            }
        }

        if !advanced {
            // backtrack: restore this choice point for a later revisit
            choices[index] = candidates_of(&from[index]).iter().collect();
            match parents.pop() {
                Some(previous) => {
                    current = previous;
                    index -= 1;
                }
                None => return None,
            }
        }
    }
}

/// Seeds the answer-tuple alignment: every variable of `answer2` is bound
/// to the corresponding term of `answer1`, so answer variables can only
/// map to answer terms of the base, never to labelled nulls.
fn seed_answer_alignment(answer1: &[Term], answer2: &[Term]) -> Option<HomomorphismBuilder> {
    let mut builder = HomomorphismBuilder::new();
    for (to, from) in answer1.iter().zip(answer2) {
        if !builder.extend(from, to) {
            return None;
        }
    }
    Some(builder)
}

// ---------------------------------------------------------------------------
// Extensional variant: raw relation atoms, foreign-key chase on demand.
// ---------------------------------------------------------------------------

pub struct ExtensionalContainmentCheck<'a> {
    chase: ChaseEngine<'a>,
    config: ContainmentConfig,
    // closure memo, keyed by the exact atom list of the containing body;
    // lives as long as this checker (one compilation pass)
    memo: RefCell<AHashMap<Vec<Atom>, Arc<FactMap>>>,
}

impl<'a> ExtensionalContainmentCheck<'a> {
    pub fn new(catalog: &'a Catalog, config: ContainmentConfig) -> Result<Self, MappingError> {
        Ok(ExtensionalContainmentCheck {
            chase: ChaseEngine::new(catalog)?,
            config,
            memo: RefCell::new(AHashMap::new()),
        })
    }

    /// Decides `query1 ⊆ query2`: every tuple producible by `query1` is
    /// producible by `query2`, under the catalog's foreign keys.
    /// Mismatched answer arities are immediately false, never attempted.
    pub fn is_contained_in(
        &self,
        answer1: &[Term],
        body1: &[Atom],
        answer2: &[Term],
        body2: &[Atom],
    ) -> Result<bool, MappingError> {
        if answer1.len() != answer2.len() {
            return Ok(false);
        }
        let Some(builder) = seed_answer_alignment(answer1, answer2) else {
            return Ok(false);
        };

        let facts = self.fact_map(body1)?;
        if !all_predicates_present(body2, &facts) {
            return Ok(false);
        }
        tracing::trace!(
            base = body1.len(),
            candidate = body2.len(),
            "extensional containment check"
        );
        Ok(some_homomorphism(builder, body2, &facts, self.config.max_search_steps).is_some())
    }

    fn fact_map(&self, body: &[Atom]) -> Result<Arc<FactMap>, MappingError> {
        if let Some(found) = self.memo.borrow().get(body) {
            return Ok(Arc::clone(found));
        }
        let mut gen = VariableGenerator::new();
        let closure = self.chase.closure(body, &mut gen)?;
        let facts = Arc::new(group_by_predicate(closure));
        self.memo
            .borrow_mut()
            .insert(body.to_vec(), Arc::clone(&facts));
        Ok(facts)
    }
}

// ---------------------------------------------------------------------------
// Linear inclusion dependencies and the Datalog-style variant.
// ---------------------------------------------------------------------------

/// `body_predicate(x_0 .. x_{n-1}) -> head_predicate(y_0 .. y_{m-1})`
/// where each head position either copies a body position or is
/// existentially quantified (a fresh labelled null when chased).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearInclusionDependency {
    pub body_predicate: String,
    pub body_arity: usize,
    pub head_predicate: String,
    pub head_positions: Vec<Option<usize>>,
}

#[derive(Debug, Default)]
pub struct LinearInclusionDependencies {
    dependencies: Vec<LinearInclusionDependency>,
    by_body: AHashMap<String, Vec<usize>>,
}

impl LinearInclusionDependencies {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates that following dependencies cannot loop: the
    /// body-to-head predicate graph must be acyclic.
    pub fn new(dependencies: Vec<LinearInclusionDependency>) -> Result<Self, MappingError> {
        let mut by_body: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (i, dep) in dependencies.iter().enumerate() {
            by_body.entry(dep.body_predicate.clone()).or_default().push(i);
        }
        let this = LinearInclusionDependencies {
            dependencies,
            by_body,
        };
        this.validate_acyclic()?;
        Ok(this)
    }

    /// One dependency per certain (all-columns-non-nullable) foreign key.
    pub fn from_foreign_keys(catalog: &Catalog) -> Result<Self, MappingError> {
        let mut dependencies = Vec::new();
        for relation in catalog.relations() {
            for fk in &relation.foreign_keys {
                if !relation.fk_is_certain(fk) {
                    continue;
                }
                let target = catalog.relation(&fk.referenced_relation)?;
                let mut head_positions = vec![None; target.arity()];
                for c in &fk.components {
                    head_positions[c.referenced] = Some(c.local);
                }
                dependencies.push(LinearInclusionDependency {
                    body_predicate: relation.name.clone(),
                    body_arity: relation.arity(),
                    head_predicate: target.name.clone(),
                    head_positions,
                });
            }
        }
        Self::new(dependencies)
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// The closure of `atoms` under the dependencies, fresh variables for
    /// every existential head position.
    pub fn chase_all_atoms(&self, atoms: &[Atom], gen: &mut VariableGenerator) -> Vec<Atom> {
        for atom in atoms {
            gen.register(atom.variables());
        }
        let mut out = Vec::new();
        for atom in atoms {
            self.chase_atom(atom, gen, &mut out);
        }
        out
    }

    fn chase_atom(&self, atom: &Atom, gen: &mut VariableGenerator, out: &mut Vec<Atom>) {
        out.push(atom.clone());
        let Some(indices) = self.by_body.get(&atom.predicate) else {
            return;
        };
        for &i in indices {
            let dep = &self.dependencies[i];
            if atom.arity() != dep.body_arity {
                continue;
            }
            let head = Atom::new(
                dep.head_predicate.clone(),
                dep.head_positions
                    .iter()
                    .map(|p| match p {
                        Some(i) => atom.terms[*i].clone(),
                        None => Term::Variable(gen.fresh()),
                    })
                    .collect(),
            );
            self.chase_atom(&head, gen, out);
        }
    }

    fn validate_acyclic(&self) -> Result<(), MappingError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }
        fn visit(
            lids: &LinearInclusionDependencies,
            predicate: &str,
            marks: &mut AHashMap<String, Mark>,
        ) -> Result<(), MappingError> {
            match marks.get(predicate) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    return Err(MappingError::CyclicForeignKeys {
                        relation: predicate.to_owned(),
                    });
                }
                None => {}
            }
            marks.insert(predicate.to_owned(), Mark::InProgress);
            if let Some(indices) = lids.by_body.get(predicate) {
                for &i in indices {
                    visit(lids, &lids.dependencies[i].head_predicate, marks)?;
                }
            }
            marks.insert(predicate.to_owned(), Mark::Done);
            Ok(())
        }

        let mut marks = AHashMap::new();
        for predicate in self.by_body.keys() {
            visit(self, predicate, &mut marks)?;
        }
        Ok(())
    }
}

/// CQ containment under linear inclusion dependencies.
///
/// Sharable across rayon workers: the closure memo is a concurrent map,
/// everything else is immutable.
pub struct CqContainmentCheck {
    dependencies: LinearInclusionDependencies,
    config: ContainmentConfig,
    memo: DashMap<Vec<Atom>, Arc<FactMap>>,
}

impl CqContainmentCheck {
    pub fn new(dependencies: LinearInclusionDependencies, config: ContainmentConfig) -> Self {
        CqContainmentCheck {
            dependencies,
            config,
            memo: DashMap::new(),
        }
    }

    pub fn from_foreign_keys(
        catalog: &Catalog,
        config: ContainmentConfig,
    ) -> Result<Self, MappingError> {
        Ok(Self::new(
            LinearInclusionDependencies::from_foreign_keys(catalog)?,
            config,
        ))
    }

    /// Decides `query1 ⊆ query2`. Heads may contain functional terms (IRI
    /// templates); alignment goes through the homomorphism builder and so
    /// handles them structurally.
    pub fn is_contained_in(
        &self,
        answer1: &[Term],
        body1: &[Atom],
        answer2: &[Term],
        body2: &[Atom],
    ) -> bool {
        self.compute_homomorphism(answer1, body1, answer2, body2)
            .is_some()
    }

    /// The witnessing substitution, when `query1 ⊆ query2`.
    pub fn compute_homomorphism(
        &self,
        answer1: &[Term],
        body1: &[Atom],
        answer2: &[Term],
        body2: &[Atom],
    ) -> Option<Substitution> {
        if answer1.len() != answer2.len() {
            return None;
        }
        let builder = seed_answer_alignment(answer1, answer2)?;

        let facts = self.fact_map(body1);
        if !all_predicates_present(body2, &facts) {
            return None;
        }
        tracing::trace!(
            base = body1.len(),
            candidate = body2.len(),
            "cq containment check"
        );
        some_homomorphism(builder, body2, &facts, self.config.max_search_steps)
    }

    fn fact_map(&self, body: &[Atom]) -> Arc<FactMap> {
        if let Some(found) = self.memo.get(body) {
            return Arc::clone(&found);
        }
        let mut gen = VariableGenerator::new();
        let closure = self.dependencies.chase_all_atoms(body, &mut gen);
        let facts = Arc::new(group_by_predicate(closure));
        self.memo.insert(body.to_vec(), Arc::clone(&facts));
        facts
    }
}
