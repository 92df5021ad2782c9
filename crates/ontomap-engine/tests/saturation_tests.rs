//! Saturation scenarios over a small hospital-flavored schema, exercising
//! the interplay of foreign keys, subsumption and redundancy elimination
//! that the per-module unit tests cover only in isolation.

use ontomap_engine::{
    ClassExpression, ClassifiedTBox, ContainmentConfig, Equivalences, EquivalencesDag, MappingKey,
    ObjectPropertyExpression, QueryNode, TMappingExclusionConfig, TMappingRule, TMappingSaturator,
};
use ontomap_model::{Atom, Attribute, Catalog, ForeignKey, Iri, RelationDefinition, Term};

const DOCTOR: &str = "http://ex.org/Doctor";
const STAFF: &str = "http://ex.org/Staff";
const TREATS: &str = "http://ex.org/treats";
const TREATED_BY: &str = "http://ex.org/treatedBy";

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add(
        RelationDefinition::table(
            "doctor",
            vec![
                Attribute::new("id", false),
                Attribute::new("dept_id", false),
            ],
        )
        .with_foreign_key(ForeignKey::new([(1, 0)], "department")),
    );
    catalog.add(RelationDefinition::table(
        "department",
        vec![Attribute::new("id", false)],
    ));
    catalog.add(RelationDefinition::table(
        "treatment",
        vec![
            Attribute::new("doctor_id", false),
            Attribute::new("patient_id", false),
        ],
    ));
    catalog
}

fn doctor_iri(var: &str) -> Term {
    Term::functional("http://ex.org/doctor/{}", vec![Term::var(var)])
}

fn patient_iri(var: &str) -> Term {
    Term::functional("http://ex.org/patient/{}", vec![Term::var(var)])
}

fn saturator(catalog: &Catalog) -> TMappingSaturator<'_> {
    TMappingSaturator::new(catalog, ContainmentConfig::default()).unwrap()
}

#[test]
fn foreign_key_collapses_a_propagated_join_rule() {
    // Doctor has two sources: a plain scan and the same scan joined with
    // department. The foreign key makes the join redundant, so the
    // saturated definition has a single disjunct.
    let catalog = catalog();
    let rules = vec![
        TMappingRule::class_rule(
            DOCTOR,
            doctor_iri("x"),
            vec![Atom::new("doctor", vec![Term::var("x"), Term::var("d")])],
        )
        .unwrap(),
        TMappingRule::class_rule(
            DOCTOR,
            doctor_iri("u"),
            vec![
                Atom::new("doctor", vec![Term::var("u"), Term::var("v")]),
                Atom::new("department", vec![Term::var("v")]),
            ],
        )
        .unwrap(),
    ];
    let tbox = ClassifiedTBox {
        classes: EquivalencesDag::new(
            vec![Equivalences::singleton(ClassExpression::Class(Iri::new(
                DOCTOR,
            )))],
            &[],
        ),
        ..Default::default()
    };
    let result = saturator(&catalog)
        .saturate(rules, &tbox, &TMappingExclusionConfig::empty())
        .unwrap();

    let doctor = result.rules(&MappingKey::class(DOCTOR)).unwrap();
    assert_eq!(doctor.len(), 1);
    assert_eq!(doctor[0].body().len(), 1);
}

#[test]
fn subsumption_and_inverse_interact_across_categories() {
    // treats ⊑ treatedBy⁻ and ∃treats ⊑ Doctor ⊑ Staff, from one
    // treatment table.
    let catalog = catalog();
    let treats = ObjectPropertyExpression::new(TREATS);
    let treated_by = ObjectPropertyExpression::new(TREATED_BY);
    let tbox = ClassifiedTBox {
        classes: EquivalencesDag::new(
            vec![
                Equivalences::singleton(ClassExpression::Class(Iri::new(STAFF))),
                Equivalences::singleton(ClassExpression::Class(Iri::new(DOCTOR))),
                Equivalences::singleton(ClassExpression::ObjectSomeValuesFrom(treats.clone())),
            ],
            &[(1, 0), (2, 1)],
        ),
        object_properties: EquivalencesDag::new(
            vec![
                Equivalences::singleton(treated_by.clone()),
                Equivalences::singleton(ObjectPropertyExpression::inverse_of(TREATS)),
            ],
            &[(1, 0)],
        ),
        ..Default::default()
    };
    let rules = vec![
        TMappingRule::property_rule(
            TREATS,
            doctor_iri("d"),
            patient_iri("p"),
            vec![Atom::new(
                "treatment",
                vec![Term::var("d"), Term::var("p")],
            )],
        )
        .unwrap(),
        TMappingRule::class_rule(
            DOCTOR,
            doctor_iri("x"),
            vec![Atom::new("doctor", vec![Term::var("x"), Term::var("y")])],
        )
        .unwrap(),
    ];
    let result = saturator(&catalog)
        .saturate(rules, &tbox, &TMappingExclusionConfig::empty())
        .unwrap();

    // Staff unions Doctor's scan with the domain of treats
    let staff = result.rules(&MappingKey::class(STAFF)).unwrap();
    assert_eq!(staff.len(), 2);
    assert!(staff
        .iter()
        .any(|r| r.head() == [doctor_iri("d")] && r.body()[0].predicate == "treatment"));

    // Doctor gets the treats domain too
    let doctor = result.rules(&MappingKey::class(DOCTOR)).unwrap();
    assert_eq!(doctor.len(), 2);

    // treatedBy inherits treats with subject and object swapped
    let treated = result.rules(&MappingKey::property(TREATED_BY)).unwrap();
    assert_eq!(treated.len(), 1);
    assert_eq!(treated[0].head(), &[patient_iri("p"), doctor_iri("d")]);

    // treats itself is untouched
    let treats_rules = result.rules(&MappingKey::property(TREATS)).unwrap();
    assert_eq!(treats_rules[0].head(), &[doctor_iri("d"), patient_iri("p")]);
}

#[test]
fn parsed_exclusion_file_shields_an_entity() {
    let catalog = catalog();
    let exclusions = TMappingExclusionConfig::parse(&format!(
        "# audited by hand\nC {STAFF}\n"
    ))
    .unwrap();
    let tbox = ClassifiedTBox {
        classes: EquivalencesDag::new(
            vec![
                Equivalences::singleton(ClassExpression::Class(Iri::new(STAFF))),
                Equivalences::singleton(ClassExpression::Class(Iri::new(DOCTOR))),
            ],
            &[(1, 0)],
        ),
        ..Default::default()
    };
    let rules = vec![
        TMappingRule::class_rule(
            STAFF,
            doctor_iri("s"),
            vec![Atom::new("doctor", vec![Term::var("s"), Term::var("t")])],
        )
        .unwrap(),
        TMappingRule::class_rule(
            DOCTOR,
            doctor_iri("x"),
            vec![Atom::new(
                "treatment",
                vec![Term::var("x"), Term::var("y")],
            )],
        )
        .unwrap(),
    ];
    let result = saturator(&catalog)
        .saturate(rules, &tbox, &exclusions)
        .unwrap();

    // Staff keeps exactly its own rule despite Doctor ⊑ Staff
    assert_eq!(result.rules(&MappingKey::class(STAFF)).unwrap().len(), 1);
    assert_eq!(result.rules(&MappingKey::class(DOCTOR)).unwrap().len(), 1);
}

#[test]
fn merged_definition_over_a_nested_view_levels_up() {
    let mut catalog = catalog();
    catalog.add(RelationDefinition::table(
        "person",
        vec![Attribute::new("id", false), Attribute::new("emails", true)],
    ));
    catalog.add(RelationDefinition::nested_view(
        "person_email",
        vec![Attribute::new("id", false), Attribute::new("email", true)],
        "person",
        1,
    ));
    let rules = vec![TMappingRule::property_rule(
        "http://ex.org/email",
        doctor_iri("x"),
        Term::var("e"),
        vec![Atom::new(
            "person_email",
            vec![Term::var("x"), Term::var("e")],
        )],
    )
    .unwrap()];
    let result = saturator(&catalog)
        .saturate(rules, &ClassifiedTBox::default(), &TMappingExclusionConfig::empty())
        .unwrap();

    let definition = result
        .definition(&MappingKey::property("http://ex.org/email"))
        .unwrap();
    // the view scan must have been rewritten to a flatten over person
    fn contains_flatten_over(node: &QueryNode, parent: &str) -> bool {
        match node {
            QueryNode::Flatten { child, .. } => matches!(
                child.as_ref(),
                QueryNode::Extensional { atom } if atom.predicate == parent
            ),
            QueryNode::Construction { child, .. } | QueryNode::Filter { child, .. } => {
                contains_flatten_over(child, parent)
            }
            QueryNode::InnerJoin { children } | QueryNode::Union { children, .. } => {
                children.iter().any(|c| contains_flatten_over(c, parent))
            }
            QueryNode::Extensional { .. } => false,
        }
    }
    assert!(contains_flatten_over(&definition.tree, "person"));
}
