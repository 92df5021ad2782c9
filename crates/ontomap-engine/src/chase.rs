//! On-demand chase over non-nullable foreign keys.
//!
//! Given a set of extensional atoms, computes the closure of atoms implied
//! with certainty by the schema's foreign keys. A key whose local columns
//! include a nullable attribute is skipped: such a referencing row may have
//! no counterpart, so no implied atom may be assumed. This non-expansion
//! is a semantic decision, not an error.
//!
//! Unknown referenced values become fresh variables (labelled nulls),
//! allocated exactly once per position so the implied atom stays
//! internally consistent. Recursion is bounded by the acyclicity of the
//! foreign-key graph, which is validated when the engine is built.

use ontomap_model::{Atom, Catalog, MappingError, Term, VariableGenerator};

pub struct ChaseEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> ChaseEngine<'a> {
    /// Fails on a cyclic foreign-key configuration.
    pub fn new(catalog: &'a Catalog) -> Result<Self, MappingError> {
        catalog.validate_acyclic_foreign_keys()?;
        Ok(ChaseEngine { catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// The flat closure: every input atom plus every atom reachable
    /// through certain (all-columns-non-nullable) foreign keys.
    pub fn closure(
        &self,
        atoms: &[Atom],
        gen: &mut VariableGenerator,
    ) -> Result<Vec<Atom>, MappingError> {
        for atom in atoms {
            gen.register(atom.variables());
        }
        let mut out = Vec::new();
        for atom in atoms {
            self.chase_atom(atom, gen, &mut out)?;
        }
        tracing::trace!(input = atoms.len(), closure = out.len(), "chased atoms");
        Ok(out)
    }

    fn chase_atom(
        &self,
        atom: &Atom,
        gen: &mut VariableGenerator,
        out: &mut Vec<Atom>,
    ) -> Result<(), MappingError> {
        let relation = self.catalog.relation(&atom.predicate)?;
        if atom.arity() != relation.arity() {
            return Err(MappingError::AtomArityMismatch {
                relation: relation.name.clone(),
                expected: relation.arity(),
                actual: atom.arity(),
            });
        }
        out.push(atom.clone());

        for fk in &relation.foreign_keys {
            if !relation.fk_is_certain(fk) {
                continue;
            }
            let target = self.catalog.relation(&fk.referenced_relation)?;
            let mut args: Vec<Option<Term>> = vec![None; target.arity()];
            for c in &fk.components {
                args[c.referenced] = Some(atom.terms[c.local].clone());
            }
            let implied = Atom::new(
                target.name.clone(),
                args.into_iter()
                    .map(|a| a.unwrap_or_else(|| Term::Variable(gen.fresh())))
                    .collect(),
            );
            self.chase_atom(&implied, gen, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_model::{Attribute, ForeignKey, RelationDefinition};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        // child(id, parent_ref) -> parent(id, grandparent_ref) -> grandparent(id)
        catalog.add(
            RelationDefinition::table(
                "child",
                vec![Attribute::new("id", false), Attribute::new("parent_ref", false)],
            )
            .with_foreign_key(ForeignKey::new([(1, 0)], "parent")),
        );
        catalog.add(
            RelationDefinition::table(
                "parent",
                vec![Attribute::new("id", false), Attribute::new("gp_ref", false)],
            )
            .with_foreign_key(ForeignKey::new([(1, 0)], "grandparent")),
        );
        catalog.add(RelationDefinition::table(
            "grandparent",
            vec![Attribute::new("id", false)],
        ));
        catalog
    }

    #[test]
    fn chase_follows_fk_chains() {
        let catalog = catalog();
        let engine = ChaseEngine::new(&catalog).unwrap();
        let mut gen = VariableGenerator::new();
        let atoms = vec![Atom::new("child", vec![Term::var("x"), Term::var("y")])];
        let closure = engine.closure(&atoms, &mut gen).unwrap();

        assert_eq!(closure.len(), 3);
        assert_eq!(closure[0].predicate, "child");
        assert_eq!(closure[1].predicate, "parent");
        assert_eq!(closure[2].predicate, "grandparent");
        // the referenced position carries the source value
        assert_eq!(closure[1].terms[0], Term::var("y"));
        // and the parent's own reference flows into the grandparent atom
        assert_eq!(closure[2].terms[0], closure[1].terms[1]);
    }

    #[test]
    fn fresh_variables_avoid_input_names() {
        let catalog = catalog();
        let engine = ChaseEngine::new(&catalog).unwrap();
        let mut gen = VariableGenerator::new();
        let atoms = vec![Atom::new("child", vec![Term::var("f0"), Term::var("y")])];
        let closure = engine.closure(&atoms, &mut gen).unwrap();
        let implied = &closure[1].terms[1];
        assert_ne!(implied, &Term::var("f0"));
        assert_ne!(implied, &Term::var("y"));
    }

    #[test]
    fn nullable_fk_columns_block_expansion() {
        let mut catalog = Catalog::new();
        catalog.add(
            RelationDefinition::table(
                "child",
                vec![Attribute::new("id", false), Attribute::new("parent_ref", true)],
            )
            .with_foreign_key(ForeignKey::new([(1, 0)], "parent")),
        );
        catalog.add(RelationDefinition::table(
            "parent",
            vec![Attribute::new("id", false)],
        ));

        let engine = ChaseEngine::new(&catalog).unwrap();
        let mut gen = VariableGenerator::new();
        let atoms = vec![Atom::new("child", vec![Term::var("x"), Term::var("y")])];
        let closure = engine.closure(&atoms, &mut gen).unwrap();
        assert_eq!(closure, atoms);
    }

    #[test]
    fn chase_is_idempotent_on_a_closed_frontier() {
        let catalog = catalog();
        let engine = ChaseEngine::new(&catalog).unwrap();
        let mut gen = VariableGenerator::new();
        // grandparent has no outgoing foreign keys
        let atoms = vec![
            Atom::new("grandparent", vec![Term::var("a")]),
            Atom::new("grandparent", vec![Term::var("b")]),
        ];
        let closure = engine.closure(&atoms, &mut gen).unwrap();
        assert_eq!(closure, atoms);
    }

    #[test]
    fn cyclic_configuration_is_fatal() {
        let mut catalog = Catalog::new();
        catalog.add(
            RelationDefinition::table("a", vec![Attribute::new("id", false)])
                .with_foreign_key(ForeignKey::new([(0, 0)], "a")),
        );
        assert!(matches!(
            ChaseEngine::new(&catalog),
            Err(MappingError::CyclicForeignKeys { .. })
        ));
    }

    #[test]
    fn wrong_arity_atom_is_rejected() {
        let catalog = catalog();
        let engine = ChaseEngine::new(&catalog).unwrap();
        let mut gen = VariableGenerator::new();
        let atoms = vec![Atom::new("child", vec![Term::var("x")])];
        assert!(matches!(
            engine.closure(&atoms, &mut gen),
            Err(MappingError::AtomArityMismatch { .. })
        ));
    }
}
