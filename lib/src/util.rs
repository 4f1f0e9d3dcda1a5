use anyhow::{anyhow, Error, Result};

use std::collections::HashMap;
use std::hash::Hash;
use std::io::Cursor;
use std::path::Path;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Graph, Triple};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use log::debug;

use crate::errors::CatalogError;

/// Grab the stable identifier from the tail of a URI: the fragment after `#`
/// if there is one, otherwise the path segment after the last `/`.
pub fn uri_tail(uri: &str) -> String {
    let delim = if uri.contains('#') { '#' } else { '/' };
    uri.rsplit(delim).next().unwrap_or(uri).to_string()
}

fn format_for_extension(ext: &str) -> Option<RdfFormat> {
    match ext {
        "ttl" => Some(RdfFormat::Turtle),
        "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        "xml" | "rdf" | "owl" => Some(RdfFormat::RdfXml),
        _ => None,
    }
}

fn parse_graph(bytes: &[u8], format: RdfFormat) -> Result<Graph> {
    let parser = RdfParser::from_format(format);
    let mut graph = Graph::new();
    for quad in parser.for_reader(Cursor::new(bytes)) {
        let quad = quad?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    Ok(graph)
}

/// Parse with the preferred format, retrying once with an explicit format
/// hint before giving up.
fn parse_with_retry(bytes: &[u8], preferred: Option<RdfFormat>, location: &str) -> Result<Graph> {
    let first = preferred.unwrap_or(RdfFormat::Turtle);
    match parse_graph(bytes, first) {
        Ok(graph) => return Ok(graph),
        Err(e) => debug!("parsing {} as {} failed: {}", location, first, e),
    }
    let hint = if first == RdfFormat::RdfXml {
        RdfFormat::Turtle
    } else {
        RdfFormat::RdfXml
    };
    match parse_graph(bytes, hint) {
        Ok(graph) => Ok(graph),
        Err(e) => {
            debug!("retry of {} as {} failed: {}", location, hint, e);
            Err(Error::new(CatalogError::ImportParse {
                location: location.to_string(),
            }))
        }
    }
}

pub fn read_file(file: &Path) -> Result<Graph> {
    debug!("reading schema document: {}", file.display());
    let bytes = std::fs::read(file)?;
    let preferred = file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(format_for_extension);
    parse_with_retry(&bytes, preferred, &file.display().to_string())
}

pub fn read_url(url: &str) -> Result<Graph> {
    debug!("fetching schema document: {}", url);
    let client = reqwest::blocking::Client::new();
    let resp = client
        .get(url)
        .header(
            ACCEPT,
            "text/turtle, application/rdf+xml;q=0.9, application/n-triples;q=0.8",
        )
        .send()?;
    if !resp.status().is_success() {
        return Err(anyhow!(
            "failed to fetch schema document from {}: {}",
            url,
            resp.status()
        ));
    }
    let preferred = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .and_then(|ct| RdfFormat::from_media_type(ct.trim()));
    let bytes = resp.bytes()?;
    parse_with_retry(&bytes, preferred, url)
}

/// Records that know their own map key. Stores keyed by id are persisted as a
/// sorted Vec of rows and re-keyed on load.
pub trait Keyed {
    type Key: Copy + Eq + Hash + Ord;
    fn key(&self) -> Self::Key;
}

pub fn keyed_map_ser<T, S>(map: &HashMap<T::Key, T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Keyed + Serialize,
    S: Serializer,
{
    let mut rows: Vec<&T> = map.values().collect();
    rows.sort_by_key(|row| row.key());
    rows.serialize(serializer)
}

pub fn keyed_map_de<'de, T, D>(deserializer: D) -> Result<HashMap<T::Key, T>, D::Error>
where
    T: Keyed + Deserialize<'de>,
    D: Deserializer<'de>,
{
    let rows: Vec<T> = Vec::deserialize(deserializer)?;
    Ok(rows.into_iter().map(|row| (row.key(), row)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_tail() {
        assert_eq!(
            uri_tail("http://www.cidoc-crm.org/cidoc-crm/E21_Person"),
            "E21_Person"
        );
        assert_eq!(uri_tail("http://example.org/vocab#Place"), "Place");
        assert_eq!(uri_tail("Literal"), "Literal");
    }

    #[test]
    fn test_read_file_retries_with_format_hint() {
        // an RDF/XML document behind a .ttl extension still parses
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ttl");
        std::fs::write(
            &path,
            r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <rdfs:Class rdf:about="http://example.org/vocab#Thing"/>
</rdf:RDF>"#,
        )
        .unwrap();
        let graph = read_file(&path).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_read_file_unparseable_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ttl");
        std::fs::write(&path, "this is not an RDF document").unwrap();
        let err = read_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::ImportParse { .. })
        ));
    }
}
