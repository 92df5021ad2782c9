//! Integration tests for the complete Ontomap pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Schema + rules → Saturator → per-entity rule sets
//! - Rule sets → Algebra definitions → Union merging
//! - Exclusion config → shielded entities
//!
//! Run with: cargo test --test integration_tests

use ontomap_engine::{
    ClassExpression, ClassifiedTBox, ContainmentConfig, Equivalences, EquivalencesDag, MappingKey,
    ObjectPropertyExpression, QueryNode, TMappingExclusionConfig, TMappingRule, TMappingSaturator,
};
use ontomap_model::{Atom, Attribute, Catalog, ForeignKey, Iri, RelationDefinition, Term};

// ============================================================================
// Fixture: a small clinical registry
// ============================================================================

const PERSON: &str = "http://clinic.example.org/Person";
const PATIENT: &str = "http://clinic.example.org/Patient";
const ATTENDS: &str = "http://clinic.example.org/attends";

fn registry_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add(RelationDefinition::table(
        "person",
        vec![Attribute::new("id", false), Attribute::new("name", true)],
    ));
    catalog.add(RelationDefinition::table(
        "patient_reg",
        vec![
            Attribute::new("id", false),
            Attribute::new("severity", true),
        ],
    ));
    catalog.add(
        RelationDefinition::table(
            "visit",
            vec![
                Attribute::new("patient_id", false),
                Attribute::new("clinic_id", false),
            ],
        )
        .with_foreign_key(ForeignKey::new([(0, 0)], "person")),
    );
    catalog
}

fn person_template(var: &str) -> Term {
    Term::functional("http://clinic.example.org/person/{}", vec![Term::var(var)])
}

fn clinic_template(var: &str) -> Term {
    Term::functional("http://clinic.example.org/clinic/{}", vec![Term::var(var)])
}

fn registry_tbox() -> ClassifiedTBox {
    // Patient ⊑ Person, ∃attends ⊑ Patient
    ClassifiedTBox {
        classes: EquivalencesDag::new(
            vec![
                Equivalences::singleton(ClassExpression::Class(Iri::new(PERSON))),
                Equivalences::singleton(ClassExpression::Class(Iri::new(PATIENT))),
                Equivalences::singleton(ClassExpression::ObjectSomeValuesFrom(
                    ObjectPropertyExpression::new(ATTENDS),
                )),
            ],
            &[(1, 0), (2, 1)],
        ),
        ..Default::default()
    }
}

fn registry_rules() -> Vec<TMappingRule> {
    vec![
        TMappingRule::class_rule(
            PERSON,
            person_template("x"),
            vec![Atom::new("person", vec![Term::var("x"), Term::var("n")])],
        )
        .unwrap(),
        TMappingRule::class_rule(
            PATIENT,
            person_template("y"),
            vec![Atom::new(
                "patient_reg",
                vec![Term::var("y"), Term::var("s")],
            )],
        )
        .unwrap(),
        TMappingRule::property_rule(
            ATTENDS,
            person_template("p"),
            clinic_template("c"),
            vec![Atom::new("visit", vec![Term::var("p"), Term::var("c")])],
        )
        .unwrap(),
    ]
}

// ============================================================================
// Rules → Saturation → Definitions
// ============================================================================

#[test]
fn test_pipeline_saturates_the_class_hierarchy() {
    let catalog = registry_catalog();
    let saturator = TMappingSaturator::new(&catalog, ContainmentConfig::default()).unwrap();
    let result = saturator
        .saturate(
            registry_rules(),
            &registry_tbox(),
            &TMappingExclusionConfig::empty(),
        )
        .unwrap();

    // Person unions its own scan with Patient's; the attends-domain rule
    // is redundant because visit.patient_id references person
    let person = result.rules(&MappingKey::class(PERSON)).unwrap();
    assert_eq!(person.len(), 2);
    assert!(person.iter().any(|r| r.body()[0].predicate == "person"));
    assert!(person.iter().any(|r| r.body()[0].predicate == "patient_reg"));
    assert!(!person.iter().any(|r| r.body()[0].predicate == "visit"));

    // no foreign key ties visit to patient_reg, so Patient keeps both
    let patient = result.rules(&MappingKey::class(PATIENT)).unwrap();
    assert_eq!(patient.len(), 2);
    assert!(patient.iter().any(|r| r.body()[0].predicate == "visit"
        && r.head() == [person_template("p")]));

    // attends itself is untouched
    let attends = result.rules(&MappingKey::property(ATTENDS)).unwrap();
    assert_eq!(attends.len(), 1);
    assert_eq!(
        attends[0].head(),
        &[person_template("p"), clinic_template("c")]
    );
}

#[test]
fn test_pipeline_produces_triple_shaped_definitions() {
    let catalog = registry_catalog();
    let saturator = TMappingSaturator::new(&catalog, ContainmentConfig::default()).unwrap();
    let result = saturator
        .saturate(
            registry_rules(),
            &registry_tbox(),
            &TMappingExclusionConfig::empty(),
        )
        .unwrap();

    // two surviving disjuncts for Person merge into a single union query
    let person_def = result.definition(&MappingKey::class(PERSON)).unwrap();
    assert_eq!(person_def.projection.arity(), 3);
    match &person_def.tree {
        QueryNode::Union { children, .. } => assert_eq!(children.len(), 2),
        other => panic!("expected a union definition, got: {other}"),
    }

    // a single disjunct stays a plain construction
    let attends_def = result.definition(&MappingKey::property(ATTENDS)).unwrap();
    assert!(matches!(attends_def.tree, QueryNode::Construction { .. }));
}

#[test]
fn test_pipeline_respects_exclusions_end_to_end() {
    let catalog = registry_catalog();
    let saturator = TMappingSaturator::new(&catalog, ContainmentConfig::default()).unwrap();
    let exclusions = TMappingExclusionConfig::parse(&format!("C {PERSON}\n")).unwrap();
    let result = saturator
        .saturate(registry_rules(), &registry_tbox(), &exclusions)
        .unwrap();

    // Person keeps only its hand-written rule
    let person = result.rules(&MappingKey::class(PERSON)).unwrap();
    assert_eq!(person.len(), 1);
    assert_eq!(person[0].body()[0].predicate, "person");

    // the rest of the hierarchy still saturates
    let patient = result.rules(&MappingKey::class(PATIENT)).unwrap();
    assert_eq!(patient.len(), 2);
}

// ============================================================================
// Cyclic foreign keys are rejected before any saturation work
// ============================================================================

#[test]
fn test_cyclic_schema_is_a_fatal_configuration_error() {
    let mut catalog = Catalog::new();
    catalog.add(
        RelationDefinition::table("a", vec![Attribute::new("id", false)])
            .with_foreign_key(ForeignKey::new([(0, 0)], "b")),
    );
    catalog.add(
        RelationDefinition::table("b", vec![Attribute::new("id", false)])
            .with_foreign_key(ForeignKey::new([(0, 0)], "a")),
    );
    assert!(TMappingSaturator::new(&catalog, ContainmentConfig::default()).is_err());
}
