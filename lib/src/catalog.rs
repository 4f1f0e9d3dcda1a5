//! The catalogue aggregate: the ontology store plus typed entity/relationship
//! instances, concept mirroring, content relations, and JSON persistence.

use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::consts::{FALLBACK_ENTITY_CLASS, TYPE_CLASS};
use crate::content::{ContentKind, ContentRef, ContentRegistry, ContentRelation};
use crate::errors::CatalogError;
use crate::hierarchy::ClassHierarchy;
use crate::ontology::{ClassId, OntologyStore, PropertyId, RdfProperty};
use crate::util::{keyed_map_de, keyed_map_ser, Keyed};
use crate::validate;

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

id_type!(EntityId);
id_type!(PropertyInstanceId);
id_type!(ConceptId);

/// What kind of record an external authority entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptKind {
    /// A resolved authority record for some real-world referent.
    Authority,
    /// A controlled-vocabulary type record.
    Type,
}

/// A record mirrored from the external concept/authority subsystem. Carries
/// just enough to drive entity mirroring: a label, an optional type
/// classifier, and the source URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    pub label: String,
    pub uri: Option<String>,
    pub kind: ConceptKind,
    pub typed: Option<String>,
}

impl Keyed for Concept {
    type Key = ConceptId;
    fn key(&self) -> ConceptId {
        self.id
    }
}

/// An instance of an RDF class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub label: String,
    pub concept: Option<ConceptId>,
    pub instance_of: ClassId,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Keyed for Entity {
    type Key = EntityId;
    fn key(&self) -> EntityId {
        self.id
    }
}

/// A directed, typed relationship between two entities, itself typed by an
/// RDF property. Only persisted after domain/range validation passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInstance {
    pub id: PropertyInstanceId,
    pub instance_of: PropertyId,
    pub source: EntityId,
    pub target: EntityId,
    pub concept: Option<ConceptId>,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Keyed for PropertyInstance {
    type Key = PropertyInstanceId;
    fn key(&self) -> PropertyInstanceId {
        self.id
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    ontology: OntologyStore,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    concepts: HashMap<ConceptId, Concept>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    entities: HashMap<EntityId, Entity>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    property_instances: HashMap<PropertyInstanceId, PropertyInstance>,
    content: ContentRegistry,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    relations: HashMap<u64, ContentRelation>,
    next_id: u64,
}

/// Searches for the .curio directory in the given directory and then
/// recursively up its parent directories. Returns the directory containing it.
pub fn find_catalog_root_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current_dir = Some(start_dir);
    while let Some(dir) = current_dir {
        if dir.join(".curio").is_dir() {
            return Some(dir.to_path_buf());
        }
        current_dir = dir.parent();
    }
    None
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn ontology(&self) -> &OntologyStore {
        &self.ontology
    }

    pub fn ontology_mut(&mut self) -> &mut OntologyStore {
        &mut self.ontology
    }

    /// Builds the traversal adjacency for the current ontology. Build once
    /// per query batch and reuse across lookups.
    pub fn hierarchy(&self) -> ClassHierarchy {
        ClassHierarchy::new(&self.ontology)
    }

    // --- entities ---

    pub fn create_entity(
        &mut self,
        label: &str,
        instance_of: ClassId,
        actor: Option<&str>,
    ) -> Result<EntityId, CatalogError> {
        self.insert_entity(label, instance_of, None, actor)
    }

    fn insert_entity(
        &mut self,
        label: &str,
        instance_of: ClassId,
        concept: Option<ConceptId>,
        actor: Option<&str>,
    ) -> Result<EntityId, CatalogError> {
        self.ontology.class(instance_of)?;
        let id = EntityId(self.next_id());
        let now = Utc::now();
        self.entities.insert(
            id,
            Entity {
                id,
                label: label.to_string(),
                concept,
                instance_of,
                creator: actor.map(|a| a.to_string()),
                created: now,
                updated: now,
            },
        );
        debug!("created entity {} `{}`", id, label);
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity, CatalogError> {
        self.entities.get(&id).ok_or(CatalogError::NotFound {
            kind: "entity",
            id: id.0,
        })
    }

    /// Relabel an entity. The creator is attributed to the acting user only
    /// when unset; an existing creator is never overwritten.
    pub fn update_entity(
        &mut self,
        id: EntityId,
        label: &str,
        actor: Option<&str>,
    ) -> Result<(), CatalogError> {
        let entity = self.entities.get_mut(&id).ok_or(CatalogError::NotFound {
            kind: "entity",
            id: id.0,
        })?;
        entity.label = label.to_string();
        if entity.creator.is_none() {
            entity.creator = actor.map(|a| a.to_string());
        }
        entity.updated = Utc::now();
        Ok(())
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    /// All entities whose class is `class` or one of its descendants, sorted
    /// by label.
    pub fn instances_of_subtree(&self, class: ClassId) -> Result<Vec<&Entity>, CatalogError> {
        let hierarchy = self.hierarchy();
        let subtree: std::collections::HashSet<ClassId> =
            hierarchy.descendants(class)?.into_iter().collect();
        let mut instances: Vec<&Entity> = self
            .entities
            .values()
            .filter(|e| subtree.contains(&e.instance_of))
            .collect();
        instances.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    /// Property types usable with instances of `class` as subject.
    pub fn available_properties(&self, class: ClassId) -> Result<Vec<&RdfProperty>, CatalogError> {
        self.hierarchy().available_properties(&self.ontology, class)
    }

    // --- typed relationships ---

    /// Checks a proposed relationship without persisting anything.
    pub fn validate_relation(
        &self,
        source: EntityId,
        property: PropertyId,
        target: EntityId,
    ) -> Result<(), CatalogError> {
        let source = self.entity(source)?;
        let target = self.entity(target)?;
        let property = self.ontology.property(property)?;
        let hierarchy = self.hierarchy();
        validate::check(&self.ontology, &hierarchy, source, property, target)
    }

    /// Validate-then-write: the instance is only inserted after the
    /// domain/range check passes, so no reader ever observes an ill-typed
    /// relationship.
    pub fn create_property_instance(
        &mut self,
        source: EntityId,
        property: PropertyId,
        target: EntityId,
        actor: Option<&str>,
    ) -> Result<PropertyInstanceId, CatalogError> {
        self.validate_relation(source, property, target)?;
        let id = PropertyInstanceId(self.next_id());
        let now = Utc::now();
        self.property_instances.insert(
            id,
            PropertyInstance {
                id,
                instance_of: property,
                source,
                target,
                concept: None,
                creator: actor.map(|a| a.to_string()),
                created: now,
                updated: now,
            },
        );
        debug!("created property instance {}", id);
        Ok(id)
    }

    pub fn property_instance(
        &self,
        id: PropertyInstanceId,
    ) -> Result<&PropertyInstance, CatalogError> {
        self.property_instances
            .get(&id)
            .ok_or(CatalogError::NotFound {
                kind: "property instance",
                id: id.0,
            })
    }

    pub fn property_instances(&self) -> impl Iterator<Item = &PropertyInstance> {
        self.property_instances.values()
    }

    pub fn num_property_instances(&self) -> usize {
        self.property_instances.len()
    }

    // --- concepts and mirroring ---

    pub fn add_concept(
        &mut self,
        label: &str,
        kind: ConceptKind,
        typed: Option<&str>,
        uri: Option<&str>,
    ) -> ConceptId {
        let id = ConceptId(self.next_id());
        self.concepts.insert(
            id,
            Concept {
                id,
                label: label.to_string(),
                uri: uri.map(|u| u.to_string()),
                kind,
                typed: typed.map(|t| t.to_string()),
            },
        );
        id
    }

    pub fn concept(&self, id: ConceptId) -> Result<&Concept, CatalogError> {
        self.concepts.get(&id).ok_or(CatalogError::NotFound {
            kind: "concept",
            id: id.0,
        })
    }

    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// Make sure a concept has a mirrored entity, creating one at most once.
    ///
    /// Called explicitly from the concept-creation workflow. A concept with a
    /// type classifier is assigned the class whose identifier contains the
    /// normalized classifier label; anything else falls back to the generic
    /// top-level class. Type records always mirror to the type class.
    pub fn ensure_mirrored_entity(
        &mut self,
        concept: ConceptId,
        actor: Option<&str>,
    ) -> Result<EntityId, CatalogError> {
        if let Some(existing) = self.entities.values().find(|e| e.concept == Some(concept)) {
            return Ok(existing.id);
        }
        let row = self.concept(concept)?.clone();
        let class = match row.kind {
            ConceptKind::Type => self.class_by_identifier_required(TYPE_CLASS)?,
            ConceptKind::Authority => match &row.typed {
                Some(typed) => {
                    let needle = typed.to_lowercase().replace(' ', "_");
                    match self.ontology.find_class_containing(&needle) {
                        Some(class) => class.id,
                        None => {
                            warn!(
                                "no class matches classifier `{}`; mirroring `{}` as {}",
                                typed, row.label, FALLBACK_ENTITY_CLASS
                            );
                            self.class_by_identifier_required(FALLBACK_ENTITY_CLASS)?
                        }
                    }
                }
                None => self.class_by_identifier_required(FALLBACK_ENTITY_CLASS)?,
            },
        };
        let id = self.insert_entity(&row.label, class, Some(concept), actor)?;
        info!("mirrored concept `{}` as entity {}", row.label, id);
        Ok(id)
    }

    fn class_by_identifier_required(&self, identifier: &str) -> Result<ClassId, CatalogError> {
        self.ontology
            .find_class(identifier)
            .map(|c| c.id)
            .ok_or_else(|| CatalogError::UnknownClass {
                identifier: identifier.to_string(),
            })
    }

    // --- content relations ---

    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentRegistry {
        &mut self.content
    }

    /// Whether a (kind, id) reference resolves to a live record.
    pub fn resolve_content(&self, reference: ContentRef) -> bool {
        match reference.kind {
            ContentKind::Entity => self.entities.contains_key(&EntityId(reference.id)),
            ContentKind::Concept => self.concepts.contains_key(&ConceptId(reference.id)),
            _ => self.content.contains(reference),
        }
    }

    /// Link two content records. Both endpoints must resolve; the optional
    /// predicate must be a known property type.
    pub fn relate(
        &mut self,
        source: ContentRef,
        target: ContentRef,
        name: &str,
        description: &str,
        instance_of: Option<PropertyId>,
        actor: Option<&str>,
    ) -> Result<u64, CatalogError> {
        for endpoint in [source, target] {
            if !self.resolve_content(endpoint) {
                return Err(CatalogError::NotFound {
                    kind: "content record",
                    id: endpoint.id,
                });
            }
        }
        if let Some(property) = instance_of {
            self.ontology.property(property)?;
        }
        let id = self.next_id();
        self.relations.insert(
            id,
            ContentRelation {
                id,
                name: name.to_string(),
                description: description.to_string(),
                instance_of,
                source,
                target,
                creator: actor.map(|a| a.to_string()),
                created: Utc::now(),
            },
        );
        Ok(id)
    }

    pub fn relations(&self) -> impl Iterator<Item = &ContentRelation> {
        self.relations.values()
    }

    // --- persistence ---

    /// Creates a `.curio` directory under `root` and saves the catalogue as
    /// catalog.json.
    pub fn save_to_directory(&self, root: &Path) -> Result<()> {
        let curio_dir = root.join(".curio");
        info!("saving catalogue to: {:?}", curio_dir);
        std::fs::create_dir_all(&curio_dir)?;
        let path = curio_dir.join("catalog.json");
        let serialized = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_directory(root: &Path) -> Result<Self> {
        Self::from_file(&root.join(".curio").join("catalog.json"))
    }
}
