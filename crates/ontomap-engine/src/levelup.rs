//! Rewrites extensional access to nested views onto their parent tables.
//!
//! A nested view is a catalog relation derived by flattening an array
//! column of a parent. Accessing the view directly forces the backend to
//! materialize it; "levelling up" replaces the view scan with a flatten
//! node over a scan of the parent, which downstream join planning can then
//! push around freely. Views may be nested several levels deep, so the
//! rewrite runs to a fixed point.

use crate::algebra::{flatten_predicate, Query, QueryNode};
use ontomap_model::{Atom, Catalog, MappingError, RelationKind, Term, VariableGenerator};
use tracing::debug;

pub struct LevelUpOptimizer<'a> {
    catalog: &'a Catalog,
}

impl<'a> LevelUpOptimizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        LevelUpOptimizer { catalog }
    }

    pub fn optimize(
        &self,
        query: Query,
        gen: &mut VariableGenerator,
    ) -> Result<Query, MappingError> {
        let seen = query.tree.all_variables();
        gen.register(seen.iter());
        let mut tree = query.tree;
        loop {
            let next = self.pass(&tree, gen)?;
            if next == tree {
                break;
            }
            tree = next;
        }
        Ok(Query {
            projection: query.projection,
            tree,
        })
    }

    fn pass(&self, node: &QueryNode, gen: &mut VariableGenerator) -> Result<QueryNode, MappingError> {
        Ok(match node {
            QueryNode::Extensional { atom } => {
                let rel = self.catalog.relation(&atom.predicate)?;
                match &rel.kind {
                    RelationKind::BaseTable => node.clone(),
                    RelationKind::NestedView {
                        parent,
                        flattened_position,
                    } => self.level_up(atom, parent, *flattened_position, gen)?,
                }
            }
            QueryNode::Construction {
                projection,
                substitution,
                child,
            } => QueryNode::Construction {
                projection: projection.clone(),
                substitution: substitution.clone(),
                child: Box::new(self.pass(child, gen)?),
            },
            QueryNode::Filter { conditions, child } => QueryNode::Filter {
                conditions: conditions.clone(),
                child: Box::new(self.pass(child, gen)?),
            },
            QueryNode::InnerJoin { children } => QueryNode::InnerJoin {
                children: children
                    .iter()
                    .map(|c| self.pass(c, gen))
                    .collect::<Result<_, _>>()?,
            },
            QueryNode::Flatten {
                array_variable,
                array_index,
                output,
                child,
            } => QueryNode::Flatten {
                array_variable: array_variable.clone(),
                array_index: *array_index,
                output: output.clone(),
                child: Box::new(self.pass(child, gen)?),
            },
            QueryNode::Union {
                projection,
                children,
            } => QueryNode::Union {
                projection: projection.clone(),
                children: children
                    .iter()
                    .map(|c| self.pass(c, gen))
                    .collect::<Result<_, _>>()?,
            },
        })
    }

    /// Replaces a scan of a nested view with a flatten over its parent.
    ///
    /// The parent scan exposes a fresh array variable at the flattened
    /// position and fresh variables everywhere else; the flatten node then
    /// re-emits the view's original terms as its output atom, leaving the
    /// rest of the tree untouched.
    fn level_up(
        &self,
        view_atom: &Atom,
        parent: &str,
        flattened_position: usize,
        gen: &mut VariableGenerator,
    ) -> Result<QueryNode, MappingError> {
        let parent_rel = self.catalog.relation(parent)?;
        let array_variable = gen.fresh();
        let parent_terms: Vec<Term> = (0..parent_rel.arity())
            .map(|pos| {
                if pos == flattened_position {
                    Term::Variable(array_variable.clone())
                } else {
                    Term::Variable(gen.fresh())
                }
            })
            .collect();
        debug!(view = %view_atom.predicate, parent, "levelling up nested view");
        Ok(QueryNode::Flatten {
            array_variable,
            array_index: 0,
            output: Atom::new(
                flatten_predicate(view_atom.arity()),
                view_atom.terms.clone(),
            ),
            child: Box::new(QueryNode::Extensional {
                atom: Atom::new(parent, parent_terms),
            }),
        })
    }
}
