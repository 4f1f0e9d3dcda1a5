use curio::{ClassHierarchy, ClassId, OntologyStore};

/// E1 <- E39 <- E21, plus an unrelated E53 root.
fn sample_store() -> (OntologyStore, ClassId, ClassId, ClassId, ClassId) {
    let mut store = OntologyStore::new();
    let schema = store.get_or_create_schema("crm", None);
    let entity = store.get_or_create_class(schema, "E1_CRM_Entity", "CRM Entity", None);
    let actor = store.get_or_create_class(schema, "E39_Actor", "Actor", None);
    let person = store.get_or_create_class(schema, "E21_Person", "Person", None);
    let place = store.get_or_create_class(schema, "E53_Place", "Place", None);
    store.set_sub_class_of(actor, entity).unwrap();
    store.set_sub_class_of(person, actor).unwrap();
    (store, entity, actor, person, place)
}

#[test]
fn test_every_class_is_its_own_ancestor_and_descendant() {
    let (store, entity, actor, person, place) = sample_store();
    let hierarchy = ClassHierarchy::new(&store);
    for class in [entity, actor, person, place] {
        assert!(hierarchy.ancestors(class).unwrap().contains(&class));
        assert!(hierarchy.descendants(class).unwrap().contains(&class));
        assert!(hierarchy.is_a(class, class).unwrap());
    }
}

#[test]
fn test_ancestors_and_descendants_are_dual() {
    let (store, entity, actor, person, place) = sample_store();
    let hierarchy = ClassHierarchy::new(&store);
    for upper in [entity, actor, person, place] {
        let below = hierarchy.descendants(upper).unwrap();
        for lower in [entity, actor, person, place] {
            let above = hierarchy.ancestors(lower).unwrap();
            assert_eq!(
                below.contains(&lower),
                above.contains(&upper),
                "duality broken between {} and {}",
                upper,
                lower
            );
        }
    }
}

#[test]
fn test_deep_chain_terminates() {
    let mut store = OntologyStore::new();
    let schema = store.get_or_create_schema("deep", None);
    let mut previous = store.get_or_create_class(schema, "C0", "C0", None);
    let root = previous;
    for i in 1..200 {
        let identifier = format!("C{}", i);
        let class = store.get_or_create_class(schema, &identifier, &identifier, None);
        store.set_sub_class_of(class, previous).unwrap();
        previous = class;
    }
    let hierarchy = ClassHierarchy::new(&store);
    assert_eq!(hierarchy.ancestors(previous).unwrap().len(), 200);
    assert_eq!(hierarchy.descendants(root).unwrap().len(), 200);
    assert!(hierarchy.is_a(previous, root).unwrap());
    assert!(!hierarchy.is_a(root, previous).unwrap());
}

#[test]
fn test_properties_widen_toward_the_leaves() {
    let (mut store, entity, actor, person, place) = sample_store();
    let schema = store.get_or_create_schema("crm", None);
    store.get_or_create_property(schema, "P1_is_identified_by", "is identified by", None, entity, place);
    store.get_or_create_property(schema, "P74_has_residence", "has residence", None, actor, place);
    store.get_or_create_property(schema, "P98_was_born_in", "was born in", None, person, place);
    let hierarchy = ClassHierarchy::new(&store);

    let names = |class: ClassId| -> Vec<String> {
        hierarchy
            .available_properties(&store, class)
            .unwrap()
            .iter()
            .map(|p| p.identifier.clone())
            .collect()
    };

    assert_eq!(names(entity), vec!["P1_is_identified_by"]);
    assert_eq!(names(actor), vec!["P1_is_identified_by", "P74_has_residence"]);
    assert_eq!(
        names(person),
        vec!["P1_is_identified_by", "P74_has_residence", "P98_was_born_in"]
    );
    // an unrelated root only sees the properties declared on itself
    assert!(names(place).is_empty());
}

#[test]
fn test_dot_output_names_every_class() {
    let (store, ..) = sample_store();
    let hierarchy = ClassHierarchy::new(&store);
    let dot = hierarchy.to_dot();
    assert!(dot.starts_with("digraph"));
    for identifier in ["E1_CRM_Entity", "E39_Actor", "E21_Person", "E53_Place"] {
        assert!(dot.contains(identifier), "missing {} in dot output", identifier);
    }
}
