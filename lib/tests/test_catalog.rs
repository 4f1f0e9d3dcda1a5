use curio::{
    find_catalog_root_from, Catalog, CatalogError, ConceptKind, ContentKind, ContentRef,
};

/// A catalogue carrying the generic entity, type and person classes the
/// mirroring workflow resolves against.
fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    let store = catalog.ontology_mut();
    let schema = store.get_or_create_schema("crm", None);
    store.get_or_create_class(schema, "E1_CRM_Entity", "CRM Entity", None);
    store.get_or_create_class(schema, "E55_Type", "Type", None);
    store.get_or_create_class(schema, "E21_Person", "Person", None);
    catalog
}

#[test]
fn test_typed_concept_mirrors_to_the_matching_class() {
    let mut catalog = sample_catalog();
    let concept = catalog.add_concept("Göte Turesson", ConceptKind::Authority, Some("Person"), None);
    let entity = catalog.ensure_mirrored_entity(concept, Some("importer")).unwrap();
    let entity = catalog.entity(entity).unwrap();
    assert_eq!(entity.label, "Göte Turesson");
    assert_eq!(entity.concept, Some(concept));
    let class = catalog.ontology().class(entity.instance_of).unwrap();
    assert_eq!(class.identifier, "E21_Person");
}

#[test]
fn test_mirroring_happens_at_most_once() {
    let mut catalog = sample_catalog();
    let concept = catalog.add_concept("Göte Turesson", ConceptKind::Authority, Some("Person"), None);
    let first = catalog.ensure_mirrored_entity(concept, None).unwrap();
    let second = catalog.ensure_mirrored_entity(concept, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(catalog.num_entities(), 1);
}

#[test]
fn test_unmatched_or_missing_classifier_falls_back() {
    let mut catalog = sample_catalog();
    let odd = catalog.add_concept("Uppsala", ConceptKind::Authority, Some("Weather Balloon"), None);
    let untyped = catalog.add_concept("Lund", ConceptKind::Authority, None, None);
    for concept in [odd, untyped] {
        let entity = catalog.ensure_mirrored_entity(concept, None).unwrap();
        let entity = catalog.entity(entity).unwrap();
        let class = catalog.ontology().class(entity.instance_of).unwrap();
        assert_eq!(class.identifier, "E1_CRM_Entity");
    }
}

#[test]
fn test_type_concepts_mirror_to_the_type_class() {
    let mut catalog = sample_catalog();
    let concept = catalog.add_concept("botanist", ConceptKind::Type, None, None);
    let entity = catalog.ensure_mirrored_entity(concept, None).unwrap();
    let entity = catalog.entity(entity).unwrap();
    let class = catalog.ontology().class(entity.instance_of).unwrap();
    assert_eq!(class.identifier, "E55_Type");
}

#[test]
fn test_mirroring_without_fallback_classes_is_an_error() {
    let mut catalog = Catalog::new();
    let concept = catalog.add_concept("Lund", ConceptKind::Authority, None, None);
    let err = catalog.ensure_mirrored_entity(concept, None).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownClass { .. }));
}

#[test]
fn test_update_entity_never_overwrites_the_creator() {
    let mut catalog = sample_catalog();
    let person = catalog.ontology().find_class("E21_Person").unwrap().id;
    let id = catalog.create_entity("Ada", person, None).unwrap();
    catalog.update_entity(id, "Ada M.", Some("editor")).unwrap();
    assert_eq!(catalog.entity(id).unwrap().creator.as_deref(), Some("editor"));
    catalog.update_entity(id, "Ada Merritt", Some("someone else")).unwrap();
    let entity = catalog.entity(id).unwrap();
    assert_eq!(entity.label, "Ada Merritt");
    assert_eq!(entity.creator.as_deref(), Some("editor"));
}

#[test]
fn test_content_relations_resolve_both_endpoints() {
    let mut catalog = sample_catalog();
    let person = catalog.ontology().find_class("E21_Person").unwrap().id;
    let entity = catalog.create_entity("Ada", person, None).unwrap();
    let post = catalog.content_mut().add_post("Field Notes", "", "body", None);

    let id = catalog
        .relate(
            ContentRef::new(ContentKind::Post, post),
            ContentRef::new(ContentKind::Entity, entity.0),
            "mentions",
            "",
            None,
            Some("editor"),
        )
        .unwrap();
    let relation = catalog.relations().find(|r| r.id == id).unwrap();
    assert_eq!(relation.name, "mentions");
    assert_eq!(relation.source.kind, ContentKind::Post);

    // a dangling endpoint is refused outright
    let err = catalog
        .relate(
            ContentRef::new(ContentKind::Post, post),
            ContentRef::new(ContentKind::Note, 404),
            "mentions",
            "",
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            kind: "content record",
            ..
        }
    ));
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = sample_catalog();
    let person = catalog.ontology().find_class("E21_Person").unwrap().id;
    let ada = catalog.create_entity("Ada", person, Some("editor")).unwrap();
    let concept = catalog.add_concept("botanist", ConceptKind::Type, None, None);
    catalog.ensure_mirrored_entity(concept, None).unwrap();
    let schema = catalog.ontology_mut().get_or_create_schema("crm", None);
    catalog
        .ontology_mut()
        .get_or_create_property(schema, "knows", "knows", None, person, person);
    let knows = catalog.ontology().find_property("knows").unwrap().id;
    catalog
        .create_property_instance(ada, knows, ada, None)
        .unwrap();

    catalog.save_to_directory(dir.path()).unwrap();
    let loaded = Catalog::from_directory(dir.path()).unwrap();
    assert_eq!(loaded, catalog);
}

#[test]
fn test_catalog_root_is_found_from_a_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    Catalog::new().save_to_directory(dir.path()).unwrap();
    let nested = dir.path().join("a/b/c");
    std::fs::create_dir_all(&nested).unwrap();
    assert_eq!(find_catalog_root_from(&nested), Some(dir.path().to_path_buf()));
    let elsewhere = tempfile::tempdir().unwrap();
    assert_eq!(find_catalog_root_from(elsewhere.path()), None);
}
