//! T-mapping saturation.
//!
//! Propagates mapping rules along the subsumption hierarchy so the
//! rewriter downstream never has to expand subclass or subproperty chains
//! at query time: each entity's definition already unions the definitions
//! of everything subsumed by it.
//!
//! Per equivalence node whose representative is eligible, the saturator
//! aggregates the rules of every transitively subsumed member (heads
//! rewritten into the representative's shape), drops rules made redundant
//! by containment, and finally copies the saturated set back to the
//! node's other eligible members. The three entity categories are
//! independent and run on separate rayon workers.
//!
//! Property nodes must carry a non-inverse representative whenever they
//! contain a non-inverse member; nodes made up entirely of inverses
//! mirror a non-inverse node and are skipped here.

use crate::algebra::{enforce_non_null, merge_definitions, Query, QueryNode};
use crate::containment::{ContainmentConfig, CqContainmentCheck, ExtensionalContainmentCheck};
use crate::dag::EquivalencesDag;
use crate::exclusion::TMappingExclusionConfig;
use crate::levelup::LevelUpOptimizer;
use crate::ontology::{ClassExpression, ClassifiedTBox};
use crate::rule::{MappingKey, TMappingRule};
use ahash::AHashMap;
use ontomap_model::iri::RDF_TYPE;
use ontomap_model::{Atom, Catalog, MappingError, Substitution, Term, Variable, VariableGenerator};
use tracing::{debug, info};

/// Rewrites a rule head between a member's shape and its representative's
/// shape. The two eligible population targets (named classes, non-inverse
/// properties) make the rewrite its own inverse, so one transformer per
/// member serves both directions.
#[derive(Debug, Clone, Copy)]
enum HeadTransformer {
    /// Project the subject of a class-membership head: position 0 for
    /// named classes and property domains, 1 for inverse-property domains
    /// (the property's range).
    Class { subject_position: usize },
    Property { swap: bool },
}

impl HeadTransformer {
    fn apply(&self, head: &[Term]) -> Result<Vec<Term>, MappingError> {
        match self {
            HeadTransformer::Class { subject_position } => head
                .get(*subject_position)
                .map(|t| vec![t.clone()])
                .ok_or_else(|| {
                    MappingError::Internal(format!(
                        "head of arity {} has no position {subject_position}",
                        head.len()
                    ))
                }),
            HeadTransformer::Property { swap: false } => Ok(head.to_vec()),
            HeadTransformer::Property { swap: true } => {
                if head.len() == 2 {
                    Ok(vec![head[1].clone(), head[0].clone()])
                } else {
                    Err(MappingError::Internal(format!(
                        "cannot swap a head of arity {}",
                        head.len()
                    )))
                }
            }
        }
    }
}

/// Inserts `new_rule` unless it is contained in an existing rule, and
/// evicts existing rules contained in it. When two rules are mutually
/// contained the incumbent wins, which keeps insertion deterministic.
fn add_minimized(rules: &mut Vec<TMappingRule>, new_rule: TMappingRule, cqc: &CqContainmentCheck) {
    if rules
        .iter()
        .any(|e| cqc.is_contained_in(new_rule.head(), new_rule.body(), e.head(), e.body()))
    {
        return;
    }
    rules.retain(|e| !cqc.is_contained_in(e.head(), e.body(), new_rule.head(), new_rule.body()));
    rules.push(new_rule);
}

/// One saturation pass over a single equivalence DAG; generic over the
/// entity category, which only differs in eligibility and head shape.
fn saturate_dag<T>(
    dag: &EquivalencesDag<T>,
    index: &AHashMap<MappingKey, Vec<TMappingRule>>,
    cqc: &CqContainmentCheck,
    rep_filter: impl Fn(&T) -> bool,
    population_filter: impl Fn(&T) -> bool,
    key_of: impl Fn(&T) -> MappingKey,
    transformer_of: impl Fn(&T) -> HeadTransformer,
) -> Result<AHashMap<MappingKey, Vec<TMappingRule>>, MappingError> {
    let mut out = AHashMap::new();
    for i in 0..dag.len() {
        let node = dag.node(i);
        let rep = node.representative();
        if !rep_filter(rep) {
            continue;
        }
        let rep_key = key_of(rep);

        let mut saturated: Vec<TMappingRule> = Vec::new();
        for sub_node in dag.sub(i) {
            for member in sub_node.members() {
                let Some(rules) = index.get(&key_of(member)) else {
                    continue;
                };
                let transformer = transformer_of(member);
                for rule in rules {
                    let head = transformer.apply(rule.head())?;
                    let rewritten = TMappingRule::new(rep_key.clone(), head, rule.body().to_vec())?;
                    add_minimized(&mut saturated, rewritten, cqc);
                }
            }
        }
        if saturated.is_empty() {
            continue;
        }
        debug!(entity = %rep_key.iri, rules = saturated.len(), "saturated node");

        for member in node.members() {
            if !population_filter(member) {
                continue;
            }
            let member_key = key_of(member);
            if member_key == rep_key {
                continue;
            }
            let transformer = transformer_of(member);
            let populated = saturated
                .iter()
                .map(|r| {
                    let head = transformer.apply(r.head())?;
                    TMappingRule::new(member_key.clone(), head, r.body().to_vec())
                })
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(member_key, populated);
        }
        out.insert(rep_key, saturated);
    }
    Ok(out)
}

/// The saturation result: minimized rule sets per entity, plus the merged
/// algebra definitions ready for SQL translation.
#[derive(Debug, Default)]
pub struct SaturatedMapping {
    rules: AHashMap<MappingKey, Vec<TMappingRule>>,
    definitions: AHashMap<MappingKey, Query>,
}

impl SaturatedMapping {
    pub fn keys(&self) -> impl Iterator<Item = &MappingKey> {
        self.rules.keys()
    }

    pub fn rules(&self, key: &MappingKey) -> Option<&[TMappingRule]> {
        self.rules.get(key).map(Vec::as_slice)
    }

    pub fn definition(&self, key: &MappingKey) -> Option<&Query> {
        self.definitions.get(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub struct TMappingSaturator<'a> {
    catalog: &'a Catalog,
    cqc: CqContainmentCheck,
    config: ContainmentConfig,
}

impl<'a> TMappingSaturator<'a> {
    pub fn new(catalog: &'a Catalog, config: ContainmentConfig) -> Result<Self, MappingError> {
        Ok(TMappingSaturator {
            catalog,
            cqc: CqContainmentCheck::from_foreign_keys(catalog, config)?,
            config,
        })
    }

    /// Saturates `rules` against the classified hierarchy.
    ///
    /// Entities excluded by `exclusions` keep their original rules (still
    /// body-minimized) and neither receive nor propagate anything, as do
    /// entities absent from the hierarchy.
    pub fn saturate(
        &self,
        rules: Vec<TMappingRule>,
        tbox: &ClassifiedTBox,
        exclusions: &TMappingExclusionConfig,
    ) -> Result<SaturatedMapping, MappingError> {
        info!(
            rules = rules.len(),
            classes = tbox.classes.len(),
            object_properties = tbox.object_properties.len(),
            data_properties = tbox.data_properties.len(),
            "saturating mapping"
        );

        // per-rule body minimization, then index by target entity
        let extensional = ExtensionalContainmentCheck::new(self.catalog, self.config)?;
        let mut index: AHashMap<MappingKey, Vec<TMappingRule>> = AHashMap::new();
        for rule in rules {
            let minimized = minimize_body(&extensional, rule)?;
            index
                .entry(minimized.key().clone())
                .or_default()
                .push(minimized);
        }

        let (class_map, (object_map, data_map)) = rayon::join(
            || {
                saturate_dag(
                    &tbox.classes,
                    &index,
                    &self.cqc,
                    |c: &ClassExpression| {
                        c.is_named_class() && !exclusions.contains_class(c.iri())
                    },
                    |c: &ClassExpression| {
                        c.is_named_class() && !exclusions.contains_class(c.iri())
                    },
                    |c: &ClassExpression| match c {
                        ClassExpression::Class(iri) => MappingKey::class(iri.clone()),
                        ClassExpression::ObjectSomeValuesFrom(p) => {
                            MappingKey::property(p.iri().clone())
                        }
                        ClassExpression::DataSomeValuesFrom(p) => {
                            MappingKey::property(p.iri().clone())
                        }
                    },
                    |c: &ClassExpression| match c {
                        ClassExpression::Class(_) => HeadTransformer::Class {
                            subject_position: 0,
                        },
                        ClassExpression::ObjectSomeValuesFrom(p) => HeadTransformer::Class {
                            subject_position: usize::from(p.is_inverse()),
                        },
                        ClassExpression::DataSomeValuesFrom(_) => HeadTransformer::Class {
                            subject_position: 0,
                        },
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        saturate_dag(
                            &tbox.object_properties,
                            &index,
                            &self.cqc,
                            |p| !p.is_inverse() && !exclusions.contains_property(p.iri()),
                            |p| !p.is_inverse() && !exclusions.contains_property(p.iri()),
                            |p| MappingKey::property(p.iri().clone()),
                            |p| HeadTransformer::Property {
                                swap: p.is_inverse(),
                            },
                        )
                    },
                    || {
                        saturate_dag(
                            &tbox.data_properties,
                            &index,
                            &self.cqc,
                            |p| !exclusions.contains_property(p.iri()),
                            |p| !exclusions.contains_property(p.iri()),
                            |p| MappingKey::property(p.iri().clone()),
                            |_| HeadTransformer::Property { swap: false },
                        )
                    },
                )
            },
        );

        let mut saturated = class_map?;
        saturated.extend(object_map?);
        saturated.extend(data_map?);

        // entities outside the hierarchy (or excluded) keep their own
        // rules, minimized against each other
        for (key, rules) in index {
            if saturated.contains_key(&key) {
                continue;
            }
            let mut minimized = Vec::new();
            for rule in rules {
                add_minimized(&mut minimized, rule, &self.cqc);
            }
            saturated.insert(key, minimized);
        }

        let optimizer = LevelUpOptimizer::new(self.catalog);
        let mut definitions = AHashMap::new();
        for (key, rules) in &saturated {
            let disjuncts = rules
                .iter()
                .map(rule_to_query)
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(merged) = merge_definitions(disjuncts)? {
                let mut gen = VariableGenerator::new();
                definitions.insert(key.clone(), optimizer.optimize(merged, &mut gen)?);
            }
        }

        info!(entities = saturated.len(), "saturation complete");
        Ok(SaturatedMapping {
            rules: saturated,
            definitions,
        })
    }
}

/// Drops body atoms whose removal does not widen the rule's answers,
/// restarting after each removal. A single remaining atom is never
/// removed: an empty body would define an unconditional triple.
fn minimize_body(
    checker: &ExtensionalContainmentCheck<'_>,
    rule: TMappingRule,
) -> Result<TMappingRule, MappingError> {
    let head = rule.head().to_vec();
    let mut body = rule.body().to_vec();
    'search: while body.len() > 1 {
        for i in 0..body.len() {
            let mut reduced = body.clone();
            reduced.remove(i);
            if checker.is_contained_in(&head, &reduced, &head, &body)? {
                body = reduced;
                continue 'search;
            }
        }
        break;
    }
    Ok(rule.with_body(body))
}

/// Lowers one rule to an algebra disjunct producing `(s, p, o)` triples,
/// with null subjects/objects filtered out below the construction.
fn rule_to_query(rule: &TMappingRule) -> Result<Query, MappingError> {
    if rule.body().is_empty() {
        return Err(MappingError::Internal(format!(
            "mapping rule for {} has an empty body",
            rule.iri()
        )));
    }
    let mut gen = VariableGenerator::new();
    for atom in rule.body() {
        gen.register(atom.variables());
    }
    for term in rule.head() {
        gen.register(term.variables());
    }
    let s = projection_variable(&mut gen, "s");
    let p = projection_variable(&mut gen, "p");
    let o = projection_variable(&mut gen, "o");

    let (subject, predicate, object) = if rule.key().is_class {
        (
            rule.head()[0].clone(),
            Term::iri(RDF_TYPE),
            Term::iri(rule.iri().as_str()),
        )
    } else {
        (
            rule.head()[0].clone(),
            Term::iri(rule.iri().as_str()),
            rule.head()[1].clone(),
        )
    };

    let mut scans: Vec<QueryNode> = rule
        .body()
        .iter()
        .map(|a| QueryNode::Extensional { atom: a.clone() })
        .collect();
    let tree = if scans.len() == 1 {
        scans.remove(0)
    } else {
        QueryNode::InnerJoin { children: scans }
    };
    let tree = enforce_non_null(tree, rule.head_variables().into_iter().cloned());

    let substitution = Substitution::new([
        (s.clone(), subject),
        (p.clone(), predicate),
        (o.clone(), object),
    ]);
    Ok(Query {
        projection: Atom::new(
            "triple",
            vec![s.clone().into(), p.clone().into(), o.clone().into()],
        ),
        tree: QueryNode::Construction {
            projection: vec![s, p, o],
            substitution,
            child: Box::new(tree),
        },
    })
}

/// A variable for the output projection that cannot collide with any
/// rule variable.
fn projection_variable(gen: &mut VariableGenerator, name: &str) -> Variable {
    let preferred = Variable::new(name);
    if gen.knows(&preferred) {
        gen.fresh_from(&preferred)
    } else {
        gen.register(std::iter::once(&preferred));
        preferred
    }
}
