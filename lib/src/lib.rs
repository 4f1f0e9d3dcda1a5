//! Ontology-backed cataloguing: import RDF/OWL vocabularies into a
//! class/property hierarchy, assert typed relationships between entity
//! instances with domain/range validation, and link editorial content
//! records to each other and to the entity graph.

pub mod catalog;
pub mod consts;
pub mod content;
pub mod errors;
pub mod hierarchy;
pub mod import;
pub mod ontology;
pub mod util;
pub mod validate;

pub use catalog::{
    find_catalog_root_from, Catalog, Concept, ConceptId, ConceptKind, Entity, EntityId,
    PropertyInstance, PropertyInstanceId,
};
pub use content::{ContentKind, ContentRef, ContentRegistry, ContentRelation};
pub use errors::{CatalogError, RelationSide};
pub use hierarchy::ClassHierarchy;
pub use import::{import_graph, import_schema, SchemaLocation};
pub use ontology::{
    ClassId, OntologyStore, PropertyId, RdfClass, RdfProperty, RdfSchema, SchemaId,
};

/// Initializes logging for the curio library.
///
/// Checks for the `CURIO_LOG` environment variable; if set, `RUST_LOG` is set
/// to its value. `CURIO_LOG` takes precedence over `RUST_LOG`. The logger
/// initialization (e.g. `env_logger::init()`) must be called after this
/// function for the level to take effect.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("CURIO_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
