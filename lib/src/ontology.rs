//! The ontology store: RDF schemas, classes and properties as relational rows
//! with stable identifiers and single-parent hierarchy edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;
use crate::util::{keyed_map_de, keyed_map_ser, Keyed};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(SchemaId);
id_type!(ClassId);
id_type!(PropertyId);

/// A named, versionable vocabulary source. Created once per imported
/// vocabulary; re-imports reuse the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfSchema {
    pub id: SchemaId,
    pub name: String,
    pub namespace: Option<String>,
    pub uri: Option<String>,
}

impl Keyed for RdfSchema {
    type Key = SchemaId;
    fn key(&self) -> SchemaId {
        self.id
    }
}

/// A node in a class hierarchy. Root classes have no parent; the parent
/// pointers are kept acyclic by [`OntologyStore::set_sub_class_of`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfClass {
    pub id: ClassId,
    pub identifier: String,
    pub label: String,
    pub comment: Option<String>,
    pub sub_class_of: Option<ClassId>,
    pub schema: SchemaId,
}

impl Keyed for RdfClass {
    type Key = ClassId;
    fn key(&self) -> ClassId {
        self.id
    }
}

impl std::fmt::Display for RdfClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.identifier, self.label)
    }
}

/// A named predicate type with a required domain and range. Range is never
/// null after import; unresolved range identifiers synthesize a placeholder
/// class instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfProperty {
    pub id: PropertyId,
    pub identifier: String,
    pub label: String,
    pub comment: Option<String>,
    pub sub_property_of: Option<PropertyId>,
    pub domain: ClassId,
    pub range: ClassId,
    pub schema: SchemaId,
}

impl Keyed for RdfProperty {
    type Key = PropertyId;
    fn key(&self) -> PropertyId {
        self.id
    }
}

impl std::fmt::Display for RdfProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.identifier, self.label)
    }
}

/// Persistent representation of all imported vocabularies. Upserts are keyed
/// by (schema, identifier); identifiers are scoped to their schema.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyStore {
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    schemas: HashMap<SchemaId, RdfSchema>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    classes: HashMap<ClassId, RdfClass>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    properties: HashMap<PropertyId, RdfProperty>,
    next_id: u64,
}

impl OntologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn get_or_create_schema(&mut self, name: &str, uri: Option<&str>) -> SchemaId {
        if let Some(schema) = self.schemas.values().find(|s| s.name == name) {
            return schema.id;
        }
        let id = SchemaId(self.next_id());
        self.schemas.insert(
            id,
            RdfSchema {
                id,
                name: name.to_string(),
                namespace: None,
                uri: uri.map(|u| u.to_string()),
            },
        );
        id
    }

    pub fn schema(&self, id: SchemaId) -> Result<&RdfSchema, CatalogError> {
        self.schemas.get(&id).ok_or(CatalogError::NotFound {
            kind: "schema",
            id: id.0,
        })
    }

    pub fn schemas(&self) -> impl Iterator<Item = &RdfSchema> {
        self.schemas.values()
    }

    /// Upsert a class by (schema, identifier). An existing row is returned
    /// untouched; label and comment are only applied at creation.
    pub fn get_or_create_class(
        &mut self,
        schema: SchemaId,
        identifier: &str,
        label: &str,
        comment: Option<String>,
    ) -> ClassId {
        if let Some(class) = self.class_by_identifier(schema, identifier) {
            return class.id;
        }
        let id = ClassId(self.next_id());
        self.classes.insert(
            id,
            RdfClass {
                id,
                identifier: identifier.to_string(),
                label: label.to_string(),
                comment,
                sub_class_of: None,
                schema,
            },
        );
        id
    }

    pub fn class(&self, id: ClassId) -> Result<&RdfClass, CatalogError> {
        self.classes.get(&id).ok_or(CatalogError::NotFound {
            kind: "class",
            id: id.0,
        })
    }

    pub fn class_by_identifier(&self, schema: SchemaId, identifier: &str) -> Option<&RdfClass> {
        self.classes
            .values()
            .find(|c| c.schema == schema && c.identifier == identifier)
    }

    /// Look a class up by identifier across all schemas. When several schemas
    /// declare the identifier, the earliest-created row wins.
    pub fn find_class(&self, identifier: &str) -> Option<&RdfClass> {
        self.classes
            .values()
            .filter(|c| c.identifier == identifier)
            .min_by_key(|c| c.id)
    }

    /// Case-insensitive substring search over class identifiers, used by
    /// concept mirroring. Deterministic: the lexicographically first matching
    /// identifier wins.
    pub fn find_class_containing(&self, needle: &str) -> Option<&RdfClass> {
        let needle = needle.to_lowercase();
        self.classes
            .values()
            .filter(|c| c.identifier.to_lowercase().contains(&needle))
            .min_by(|a, b| a.identifier.cmp(&b.identifier).then(a.id.cmp(&b.id)))
    }

    pub fn classes(&self) -> impl Iterator<Item = &RdfClass> {
        self.classes.values()
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Wire a subclass edge. Rejects an edge that would close a cycle; the
    /// parent-pointer graph must stay a forest or traversal would not
    /// terminate.
    pub fn set_sub_class_of(&mut self, child: ClassId, parent: ClassId) -> Result<(), CatalogError> {
        let child_identifier = self.class(child)?.identifier.clone();
        self.class(parent)?;
        // walk rootward from the parent; finding the child means a cycle
        let mut seen = std::collections::HashSet::new();
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child || !seen.insert(current) {
                return Err(CatalogError::CycleDetected {
                    identifier: child_identifier,
                });
            }
            cursor = self.class(current)?.sub_class_of;
        }
        if let Some(class) = self.classes.get_mut(&child) {
            class.sub_class_of = Some(parent);
        }
        Ok(())
    }

    /// Upsert a property by (schema, identifier). Domain and range are
    /// refreshed on every upsert, so a re-import picks up corrected edges.
    pub fn get_or_create_property(
        &mut self,
        schema: SchemaId,
        identifier: &str,
        label: &str,
        comment: Option<String>,
        domain: ClassId,
        range: ClassId,
    ) -> PropertyId {
        if let Some(id) = self
            .property_by_identifier(schema, identifier)
            .map(|p| p.id)
        {
            if let Some(property) = self.properties.get_mut(&id) {
                property.domain = domain;
                property.range = range;
            }
            return id;
        }
        let id = PropertyId(self.next_id());
        self.properties.insert(
            id,
            RdfProperty {
                id,
                identifier: identifier.to_string(),
                label: label.to_string(),
                comment,
                sub_property_of: None,
                domain,
                range,
                schema,
            },
        );
        id
    }

    pub fn property(&self, id: PropertyId) -> Result<&RdfProperty, CatalogError> {
        self.properties.get(&id).ok_or(CatalogError::NotFound {
            kind: "property",
            id: id.0,
        })
    }

    pub fn property_by_identifier(
        &self,
        schema: SchemaId,
        identifier: &str,
    ) -> Option<&RdfProperty> {
        self.properties
            .values()
            .find(|p| p.schema == schema && p.identifier == identifier)
    }

    pub fn find_property(&self, identifier: &str) -> Option<&RdfProperty> {
        self.properties
            .values()
            .filter(|p| p.identifier == identifier)
            .min_by_key(|p| p.id)
    }

    pub fn properties(&self) -> impl Iterator<Item = &RdfProperty> {
        self.properties.values()
    }

    pub fn num_properties(&self) -> usize {
        self.properties.len()
    }

    pub fn set_sub_property_of(
        &mut self,
        child: PropertyId,
        parent: PropertyId,
    ) -> Result<(), CatalogError> {
        let child_identifier = self.property(child)?.identifier.clone();
        self.property(parent)?;
        let mut seen = std::collections::HashSet::new();
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child || !seen.insert(current) {
                return Err(CatalogError::CycleDetected {
                    identifier: child_identifier,
                });
            }
            cursor = self.property(current)?.sub_property_of;
        }
        if let Some(property) = self.properties.get_mut(&child) {
            property.sub_property_of = Some(parent);
        }
        Ok(())
    }
}
