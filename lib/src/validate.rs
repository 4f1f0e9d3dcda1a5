//! Domain/range type checking for proposed typed relationships.
//!
//! A relationship is well-typed when its source entity is an instance of the
//! property's domain class (or a descendant of it) and its target entity is
//! an instance of the range class likewise. Checks are read-only; the caller
//! persists the edge only after a clean result.

use crate::catalog::Entity;
use crate::errors::{CatalogError, RelationSide};
use crate::hierarchy::ClassHierarchy;
use crate::ontology::{OntologyStore, RdfProperty};

pub fn check(
    store: &OntologyStore,
    hierarchy: &ClassHierarchy,
    source: &Entity,
    property: &RdfProperty,
    target: &Entity,
) -> Result<(), CatalogError> {
    if !hierarchy.is_a(source.instance_of, property.domain)? {
        return Err(CatalogError::Validation {
            side: RelationSide::Source,
            entity: source.label.clone(),
            property: property.identifier.clone(),
            expected: store.class(property.domain)?.identifier.clone(),
            found: store.class(source.instance_of)?.identifier.clone(),
        });
    }
    if !hierarchy.is_a(target.instance_of, property.range)? {
        return Err(CatalogError::Validation {
            side: RelationSide::Target,
            entity: target.label.clone(),
            property: property.identifier.clone(),
            expected: store.class(property.range)?.identifier.clone(),
            found: store.class(target.instance_of)?.identifier.clone(),
        });
    }
    Ok(())
}
