//! Relational-algebra query trees.
//!
//! A closed tagged variant with exhaustive matching everywhere: adding a
//! node kind surfaces every call site needing an update at compile time.
//! Trees are immutable values; rewriters return new trees and compare
//! structurally to detect fixed points.

use ontomap_model::{Atom, MappingError, Substitution, Term, Variable, VariableGenerator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A boolean filter condition (conjunctions are lists of these).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    IsNotNull(Variable),
    Equals(Term, Term),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryNode {
    /// Projects `projection`, each variable bound by `substitution`
    /// (identity for variables produced by the child).
    Construction {
        projection: Vec<Variable>,
        substitution: Substitution,
        child: Box<QueryNode>,
    },
    Filter {
        conditions: Vec<Condition>,
        child: Box<QueryNode>,
    },
    InnerJoin {
        children: Vec<QueryNode>,
    },
    /// One output row per element of the array bound to `array_variable`
    /// in the child; `output` names the columns the elements expose.
    Flatten {
        array_variable: Variable,
        array_index: usize,
        output: Atom,
        child: Box<QueryNode>,
    },
    Extensional {
        atom: Atom,
    },
    Union {
        projection: Vec<Variable>,
        children: Vec<QueryNode>,
    },
}

/// A complete query definition: a distinct-variable projection atom over a
/// tree that produces those variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub projection: Atom,
    pub tree: QueryNode,
}

/// The synthetic predicate of a flatten node's output atom.
pub fn flatten_predicate(arity: usize) -> String {
    format!("flatten{arity}")
}

impl QueryNode {
    /// Every variable occurring anywhere in the subtree.
    pub fn all_variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            QueryNode::Construction {
                projection,
                substitution,
                child,
            } => {
                out.extend(projection.iter().cloned());
                for (v, t) in substitution.iter() {
                    out.insert(v.clone());
                    out.extend(t.variables().into_iter().cloned());
                }
                child.collect_variables(out);
            }
            QueryNode::Filter { conditions, child } => {
                for c in conditions {
                    match c {
                        Condition::IsNotNull(v) => {
                            out.insert(v.clone());
                        }
                        Condition::Equals(l, r) => {
                            out.extend(l.variables().into_iter().cloned());
                            out.extend(r.variables().into_iter().cloned());
                        }
                    }
                }
                child.collect_variables(out);
            }
            QueryNode::InnerJoin { children } | QueryNode::Union { children, .. } => {
                for c in children {
                    c.collect_variables(out);
                }
            }
            QueryNode::Flatten {
                array_variable,
                output,
                child,
                ..
            } => {
                out.insert(array_variable.clone());
                out.extend(output.variables().into_iter().cloned());
                child.collect_variables(out);
            }
            QueryNode::Extensional { atom } => {
                out.extend(atom.variables().into_iter().cloned());
            }
        }
    }

    /// Applies a variable-to-variable renaming throughout the subtree.
    pub fn rename(&self, renaming: &Substitution) -> QueryNode {
        let rename_var = |v: &Variable| -> Variable {
            match renaming.apply_var(v) {
                Term::Variable(nv) => nv,
                // renamings are var-to-var by construction
                _ => v.clone(),
            }
        };
        match self {
            QueryNode::Construction {
                projection,
                substitution,
                child,
            } => QueryNode::Construction {
                projection: projection.iter().map(rename_var).collect(),
                substitution: Substitution::new(
                    substitution
                        .iter()
                        .map(|(v, t)| (rename_var(v), renaming.apply(t))),
                ),
                child: Box::new(child.rename(renaming)),
            },
            QueryNode::Filter { conditions, child } => QueryNode::Filter {
                conditions: conditions
                    .iter()
                    .map(|c| match c {
                        Condition::IsNotNull(v) => Condition::IsNotNull(rename_var(v)),
                        Condition::Equals(l, r) => {
                            Condition::Equals(renaming.apply(l), renaming.apply(r))
                        }
                    })
                    .collect(),
                child: Box::new(child.rename(renaming)),
            },
            QueryNode::InnerJoin { children } => QueryNode::InnerJoin {
                children: children.iter().map(|c| c.rename(renaming)).collect(),
            },
            QueryNode::Flatten {
                array_variable,
                array_index,
                output,
                child,
            } => QueryNode::Flatten {
                array_variable: rename_var(array_variable),
                array_index: *array_index,
                output: output.apply(renaming),
                child: Box::new(child.rename(renaming)),
            },
            QueryNode::Extensional { atom } => QueryNode::Extensional {
                atom: atom.apply(renaming),
            },
            QueryNode::Union {
                projection,
                children,
            } => QueryNode::Union {
                projection: projection.iter().map(rename_var).collect(),
                children: children.iter().map(|c| c.rename(renaming)).collect(),
            },
        }
    }
}

/// Wraps `tree` in a filter dropping rows where any of `vars` is null.
/// A null key position cannot correspond to any RDF term.
pub fn enforce_non_null(
    tree: QueryNode,
    vars: impl IntoIterator<Item = Variable>,
) -> QueryNode {
    let vars: BTreeSet<Variable> = vars.into_iter().collect();
    if vars.is_empty() {
        return tree;
    }
    QueryNode::Filter {
        conditions: vars.into_iter().map(Condition::IsNotNull).collect(),
        child: Box::new(tree),
    }
}

/// Union-merges several definitions of the same predicate into one query.
///
/// The first definition's projection atom becomes canonical; every other
/// definition is aligned to it by renaming its projected variables
/// position-wise and its remaining variables injectively to fresh names.
pub fn merge_definitions(definitions: Vec<Query>) -> Result<Option<Query>, MappingError> {
    let mut iter = definitions.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let rest: Vec<Query> = iter.collect();
    if rest.is_empty() {
        return Ok(Some(first));
    }

    let canonical = first.projection.clone();
    let canonical_vars: Vec<Variable> = projection_variables(&canonical)?;

    let mut gen = VariableGenerator::from_variables(&first.tree.all_variables());
    gen.register(&canonical_vars);

    let mut children = vec![first.tree];
    for def in rest {
        if def.projection.predicate != canonical.predicate
            || def.projection.arity() != canonical.arity()
        {
            return Err(MappingError::HeadArityMismatch {
                entity: def.projection.predicate.clone(),
                expected: canonical.arity(),
                actual: def.projection.arity(),
            });
        }
        let def_vars = projection_variables(&def.projection)?;

        let all_vars = def.tree.all_variables();
        let inner = Substitution::injective_renaming(
            all_vars.iter().filter(|v| !def_vars.contains(*v)),
            &mut gen,
        );
        let alignment = Substitution::new(
            def_vars
                .iter()
                .zip(&canonical_vars)
                .map(|(from, to)| (from.clone(), Term::Variable(to.clone()))),
        );
        let renaming = Substitution::union(&alignment, &inner)?;
        children.push(def.tree.rename(&renaming));
    }

    Ok(Some(Query {
        projection: canonical,
        tree: QueryNode::Union {
            projection: canonical_vars,
            children,
        },
    }))
}

fn projection_variables(atom: &Atom) -> Result<Vec<Variable>, MappingError> {
    atom.terms
        .iter()
        .map(|t| {
            t.as_variable().cloned().ok_or_else(|| {
                MappingError::Internal(format!(
                    "projection atom {atom} must contain only distinct variables"
                ))
            })
        })
        .collect()
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn indent(node: &QueryNode, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            let pad = "  ".repeat(depth);
            match node {
                QueryNode::Construction {
                    projection,
                    substitution,
                    child,
                } => {
                    writeln!(
                        f,
                        "{pad}CONSTRUCT [{}] {substitution}",
                        projection
                            .iter()
                            .map(|v| v.name())
                            .collect::<Vec<_>>()
                            .join(",")
                    )?;
                    indent(child, f, depth + 1)
                }
                QueryNode::Filter { conditions, child } => {
                    writeln!(f, "{pad}FILTER {conditions:?}")?;
                    indent(child, f, depth + 1)
                }
                QueryNode::InnerJoin { children } => {
                    writeln!(f, "{pad}JOIN")?;
                    for c in children {
                        indent(c, f, depth + 1)?;
                    }
                    Ok(())
                }
                QueryNode::Flatten {
                    array_variable,
                    array_index,
                    output,
                    child,
                } => {
                    writeln!(f, "{pad}FLATTEN {array_variable}@{array_index} -> {output}")?;
                    indent(child, f, depth + 1)
                }
                QueryNode::Extensional { atom } => writeln!(f, "{pad}{atom}"),
                QueryNode::Union {
                    projection,
                    children,
                } => {
                    writeln!(
                        f,
                        "{pad}UNION [{}]",
                        projection
                            .iter()
                            .map(|v| v.name())
                            .collect::<Vec<_>>()
                            .join(",")
                    )?;
                    for c in children {
                        indent(c, f, depth + 1)?;
                    }
                    Ok(())
                }
            }
        }
        indent(self, f, 0)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} :-", self.projection)?;
        write!(f, "{}", self.tree)
    }
}
