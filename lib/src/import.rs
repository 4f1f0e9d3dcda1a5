//! The schema importer: parses an external RDF/OWL document and materializes
//! it into schema, class, and property rows.
//!
//! Source documents may declare `subClassOf`/`subPropertyOf` before the
//! parent node itself is visited, so hierarchy edges are resolved in a second
//! pass: pass one creates all nodes and records pending edges against an
//! in-memory identifier index, pass two wires them up.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info, warn};
use oxigraph::model::{Graph, SubjectRef, TermRef};

use crate::catalog::Catalog;
use crate::consts::{
    COMMENT, DESCRIPTION, DOMAIN, LABEL, LITERAL_CLASS, OWL_CLASS, RANGE, RDFS_CLASS,
    RDF_PROPERTY, SUB_CLASS_OF, SUB_PROPERTY_OF, TYPE,
};
use crate::ontology::{ClassId, SchemaId};
use crate::util::{read_file, read_url, uri_tail};

/// Where a schema document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocation {
    File(PathBuf),
    Url(String),
}

impl std::fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaLocation::File(p) => write!(f, "file://{}", p.to_str().unwrap_or_default()),
            SchemaLocation::Url(u) => write!(f, "{}", u),
        }
    }
}

impl SchemaLocation {
    pub fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("http") {
            Ok(SchemaLocation::Url(s.to_string()))
        } else {
            let s = s.trim_start_matches("file://");
            let mut p = PathBuf::from(s);
            if !p.is_absolute() {
                p = std::env::current_dir()?.join(p);
            }
            Ok(SchemaLocation::File(p))
        }
    }

    pub fn graph(&self) -> Result<Graph> {
        match self {
            SchemaLocation::File(p) => read_file(p),
            SchemaLocation::Url(u) => read_url(u),
        }
    }
}

/// Import the schema document at `location` under the given display name.
/// Idempotent: re-importing upserts by (schema, identifier) and does not
/// discard previously resolved hierarchy edges.
pub fn import_schema(
    catalog: &mut Catalog,
    location: &SchemaLocation,
    name: &str,
) -> Result<SchemaId> {
    let graph = location.graph()?;
    import_graph(catalog, &graph, name, Some(&location.to_string()))
}

/// Materialize an already-parsed RDF graph into the ontology store.
pub fn import_graph(
    catalog: &mut Catalog,
    graph: &Graph,
    name: &str,
    uri: Option<&str>,
) -> Result<SchemaId> {
    let store = catalog.ontology_mut();
    let schema = store.get_or_create_schema(name, uri);

    // the synthetic Literal class is a catch-all leaf type; index it so it
    // can serve as a domain/range fallback during this import
    let mut classes: HashMap<String, ClassId> = HashMap::new();
    let literal = store.get_or_create_class(schema, LITERAL_CLASS, LITERAL_CLASS, None);
    classes.insert(LITERAL_CLASS.to_string(), literal);

    // pass 1: classes. Some schemas type their classes with owl:Class.
    let class_subjects: Vec<SubjectRef> = graph
        .subjects_for_predicate_object(TYPE, RDFS_CLASS)
        .chain(graph.subjects_for_predicate_object(TYPE, OWL_CLASS))
        .collect();
    let mut pending_subclass: Vec<(String, String)> = Vec::new();
    for subject in &class_subjects {
        let iri = match subject {
            SubjectRef::NamedNode(n) => n,
            _ => {
                debug!("skipping class declaration on non-IRI subject {}", subject);
                continue;
            }
        };
        let identifier = uri_tail(iri.as_str());
        let label = resolve_label(graph, *subject, &identifier);
        let comment = resolve_comment(graph, *subject);
        let id = store.get_or_create_class(schema, &identifier, &label, comment);
        classes.insert(identifier.clone(), id);

        // the parent may not be materialized yet; defer the edge
        if let Some(parent) = first_object_identifier(graph, *subject, SUB_CLASS_OF) {
            pending_subclass.push((identifier, parent));
        }
    }

    // pass 2: wire subclass edges from the identifier index
    for (child, parent) in pending_subclass {
        match (classes.get(&child), classes.get(&parent)) {
            (Some(c), Some(p)) => store.set_sub_class_of(*c, *p)?,
            _ => warn!(
                "skipping subclass edge {} -> {}: parent not declared in this document",
                child, parent
            ),
        }
    }

    // pass 1: properties, with domain/range resolution against the class
    // index. Domains are expected to be previously-seen classes; an unknown
    // range identifier synthesizes a placeholder class in the same schema.
    let property_subjects: Vec<SubjectRef> = graph
        .subjects_for_predicate_object(TYPE, RDF_PROPERTY)
        .collect();
    let mut pending_subproperty: Vec<(String, String)> = Vec::new();
    let mut properties = HashMap::new();
    for subject in &property_subjects {
        let iri = match subject {
            SubjectRef::NamedNode(n) => n,
            _ => {
                debug!(
                    "skipping property declaration on non-IRI subject {}",
                    subject
                );
                continue;
            }
        };
        let identifier = uri_tail(iri.as_str());
        let label = resolve_label(graph, *subject, &identifier);
        let comment = resolve_comment(graph, *subject);

        let domain = match first_object_identifier(graph, *subject, DOMAIN) {
            Some(domain_identifier) => match classes.get(&domain_identifier) {
                Some(id) => *id,
                None => {
                    warn!(
                        "domain `{}` of property `{}` is not a known class; using {}",
                        domain_identifier, identifier, LITERAL_CLASS
                    );
                    literal
                }
            },
            None => {
                warn!(
                    "property `{}` declares no domain; using {}",
                    identifier, LITERAL_CLASS
                );
                literal
            }
        };

        let range = match first_object_identifier(graph, *subject, RANGE) {
            Some(range_identifier) => match classes.get(&range_identifier).copied() {
                Some(id) => id,
                None => {
                    // forward-reference recovery: ranges may point at classes
                    // the document never declares
                    debug!(
                        "synthesizing class `{}` for the range of `{}`",
                        range_identifier, identifier
                    );
                    let id = store.get_or_create_class(
                        schema,
                        &range_identifier,
                        &range_identifier,
                        None,
                    );
                    classes.insert(range_identifier, id);
                    id
                }
            },
            None => {
                warn!(
                    "property `{}` declares no range; using {}",
                    identifier, LITERAL_CLASS
                );
                literal
            }
        };

        let id = store.get_or_create_property(schema, &identifier, &label, comment, domain, range);
        properties.insert(identifier.clone(), id);

        if let Some(parent) = first_object_identifier(graph, *subject, SUB_PROPERTY_OF) {
            pending_subproperty.push((identifier, parent));
        }
    }

    // pass 2: wire subproperty edges
    for (child, parent) in pending_subproperty {
        match (properties.get(&child), properties.get(&parent)) {
            (Some(c), Some(p)) => store.set_sub_property_of(*c, *p)?,
            _ => warn!(
                "skipping subproperty edge {} -> {}: parent not declared in this document",
                child, parent
            ),
        }
    }

    info!(
        "imported schema `{}`: {} classes, {} properties in store",
        name,
        store.num_classes(),
        store.num_properties()
    );
    Ok(schema)
}

/// Try to find the English label. Short of that, choose the first label, then
/// fall back to the identifier itself.
fn resolve_label(graph: &Graph, subject: SubjectRef, identifier: &str) -> String {
    let mut first = None;
    for term in graph.objects_for_subject_predicate(subject, LABEL) {
        if let TermRef::Literal(literal) = term {
            if literal.language() == Some("en") {
                return literal.value().to_string();
            }
            if first.is_none() {
                first = Some(literal.value().to_string());
            }
        }
    }
    first.unwrap_or_else(|| identifier.to_string())
}

/// Prefer the description predicate; comment is fine, too.
fn resolve_comment(graph: &Graph, subject: SubjectRef) -> Option<String> {
    for predicate in [DESCRIPTION, COMMENT] {
        for term in graph.objects_for_subject_predicate(subject, predicate) {
            if let TermRef::Literal(literal) = term {
                return Some(literal.value().to_string());
            }
        }
    }
    None
}

/// Identifier from the first IRI object of the given predicate, if any.
fn first_object_identifier(
    graph: &Graph,
    subject: SubjectRef,
    predicate: oxigraph::model::NamedNodeRef,
) -> Option<String> {
    graph
        .objects_for_subject_predicate(subject, predicate)
        .find_map(|term| match term {
            TermRef::NamedNode(n) => Some(uri_tail(n.as_str())),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_location_from_str() {
        let url = SchemaLocation::from_str("http://example.org/vocab.ttl").unwrap();
        assert!(matches!(url, SchemaLocation::Url(_)));
        let file = SchemaLocation::from_str("/tmp/vocab.ttl").unwrap();
        assert_eq!(file, SchemaLocation::File(PathBuf::from("/tmp/vocab.ttl")));
        assert_eq!(file.to_string(), "file:///tmp/vocab.ttl");
    }
}
