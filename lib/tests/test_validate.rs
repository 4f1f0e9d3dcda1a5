use curio::{Catalog, CatalogError, ClassId, EntityId, PropertyId, RelationSide};

/// A catalogue with Person, Place and City classes, a bornIn property
/// (Person -> Place), and one entity of each class.
fn sample_catalog() -> (Catalog, PropertyId, EntityId, EntityId, EntityId) {
    let mut catalog = Catalog::new();
    let store = catalog.ontology_mut();
    let schema = store.get_or_create_schema("people", None);
    let person = store.get_or_create_class(schema, "Person", "Person", None);
    let place = store.get_or_create_class(schema, "Place", "Place", None);
    let city = store.get_or_create_class(schema, "City", "City", None);
    store.set_sub_class_of(city, place).unwrap();
    let born_in = store.get_or_create_property(schema, "bornIn", "born in", None, person, place);

    let ada = catalog.create_entity("Ada", person, Some("editor")).unwrap();
    let turin = catalog.create_entity("Turin", city, Some("editor")).unwrap();
    let bob = catalog.create_entity("Bob", person, Some("editor")).unwrap();
    (catalog, born_in, ada, turin, bob)
}

#[test]
fn test_target_may_be_a_descendant_of_the_range() {
    let (mut catalog, born_in, ada, turin, _) = sample_catalog();
    // Turin is a City, a descendant of the declared range Place
    catalog.validate_relation(ada, born_in, turin).unwrap();
    let id = catalog
        .create_property_instance(ada, born_in, turin, Some("editor"))
        .unwrap();
    let instance = catalog.property_instance(id).unwrap();
    assert_eq!(instance.source, ada);
    assert_eq!(instance.target, turin);
    assert_eq!(instance.creator.as_deref(), Some("editor"));
}

#[test]
fn test_ill_typed_target_is_rejected_and_nothing_persists() {
    let (mut catalog, born_in, ada, _, bob) = sample_catalog();
    // Bob is a Person, not a Place
    let err = catalog
        .create_property_instance(ada, born_in, bob, None)
        .unwrap_err();
    match &err {
        CatalogError::Validation {
            side,
            entity,
            property,
            expected,
            found,
        } => {
            assert_eq!(*side, RelationSide::Target);
            assert_eq!(entity, "Bob");
            assert_eq!(property, "bornIn");
            assert_eq!(expected, "Place");
            assert_eq!(found, "Person");
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert!(err.to_string().contains("requires its target to be a `Place`"));
    // validate-then-write: the rejected edge was never inserted
    assert_eq!(catalog.num_property_instances(), 0);
}

#[test]
fn test_ill_typed_source_is_rejected() {
    let (mut catalog, born_in, _, turin, _) = sample_catalog();
    let err = catalog
        .create_property_instance(turin, born_in, turin, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation {
            side: RelationSide::Source,
            ..
        }
    ));
}

#[test]
fn test_unknown_endpoints_are_not_found() {
    let (mut catalog, born_in, ada, _, _) = sample_catalog();
    let err = catalog
        .create_property_instance(ada, born_in, EntityId(9999), None)
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: "entity", .. }));
    let err = catalog
        .validate_relation(ada, PropertyId(9999), ada)
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: "property",
            ..
        }
    ));
}

#[test]
fn test_entity_creation_requires_a_known_class() {
    let mut catalog = Catalog::new();
    let err = catalog.create_entity("Ada", ClassId(1), None).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: "class", .. }));
}
