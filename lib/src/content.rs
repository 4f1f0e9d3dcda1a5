//! Editorial content records (posts, notes, images, tags) and the typed
//! registry that content relations resolve their endpoints against.
//!
//! Relation endpoints are weak references: a kind tag plus a numeric id,
//! looked up against the registry, never an owning pointer.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ontology::PropertyId;
use crate::util::{keyed_map_de, keyed_map_ser, Keyed};

/// The closed set of record kinds a content relation may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Note,
    Image,
    Entity,
    Concept,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Post => write!(f, "post"),
            ContentKind::Note => write!(f, "note"),
            ContentKind::Image => write!(f, "image"),
            ContentKind::Entity => write!(f, "entity"),
            ContentKind::Concept => write!(f, "concept"),
        }
    }
}

/// A weak polymorphic reference to a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: u64,
}

impl ContentRef {
    pub fn new(kind: ContentKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Parses the `kind:id` form used on the command line, e.g. `post:12`.
    pub fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected a kind:id reference, got `{}`", s))?;
        let kind = match kind {
            "post" => ContentKind::Post,
            "note" => ContentKind::Note,
            "image" => ContentKind::Image,
            "entity" => ContentKind::Entity,
            "concept" => ContentKind::Concept,
            other => return Err(anyhow!("unknown content kind `{}`", other)),
        };
        Ok(Self {
            kind,
            id: id.parse()?,
        })
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A directed, optionally predicate-typed edge between any two content
/// records. The relation owns the edge; the endpoints are resolved by
/// (kind, id) lookup and never cascade deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRelation {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub instance_of: Option<PropertyId>,
    pub source: ContentRef,
    pub target: ContentRef,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
}

impl Keyed for ContentRelation {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub body: String,
    pub published: bool,
    pub tags: Vec<u64>,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Keyed for Post {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub content: String,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Keyed for Note {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
}

/// An external resource record: a pointer into some collection or archive,
/// identified within its source system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub source: String,
    pub identifier: String,
    pub identifier_type: String,
    pub description: String,
    pub file: String,
    pub creator: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Keyed for Image {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl Keyed for Tag {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
}

/// Reduce a title to a URL-safe slug, truncated to 100 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(100);
    slug
}

/// Typed stores for editorial records, keyed by numeric id.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRegistry {
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    posts: HashMap<u64, Post>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    notes: HashMap<u64, Note>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    images: HashMap<u64, Image>,
    #[serde(serialize_with = "keyed_map_ser", deserialize_with = "keyed_map_de")]
    tags: HashMap<u64, Tag>,
    next_id: u64,
}

impl ContentRegistry {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_post(
        &mut self,
        title: &str,
        summary: &str,
        body: &str,
        creator: Option<&str>,
    ) -> u64 {
        let id = self.next_id();
        let now = Utc::now();
        self.posts.insert(
            id,
            Post {
                id,
                title: title.to_string(),
                slug: slugify(title),
                summary: summary.to_string(),
                body: body.to_string(),
                published: false,
                tags: Vec::new(),
                creator: creator.map(|c| c.to_string()),
                created: now,
                updated: now,
            },
        );
        id
    }

    pub fn publish_post(&mut self, id: u64) -> bool {
        match self.posts.get_mut(&id) {
            Some(post) => {
                post.published = true;
                post.updated = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn tag_post(&mut self, post: u64, tag: u64) -> bool {
        if !self.tags.contains_key(&tag) {
            return false;
        }
        match self.posts.get_mut(&post) {
            Some(p) => {
                if !p.tags.contains(&tag) {
                    p.tags.push(tag);
                }
                true
            }
            None => false,
        }
    }

    pub fn add_note(&mut self, content: &str, creator: Option<&str>) -> u64 {
        let id = self.next_id();
        let now = Utc::now();
        self.notes.insert(
            id,
            Note {
                id,
                content: content.to_string(),
                creator: creator.map(|c| c.to_string()),
                created: now,
                updated: now,
            },
        );
        id
    }

    pub fn add_image(
        &mut self,
        source: &str,
        identifier: &str,
        identifier_type: &str,
        description: &str,
        file: &str,
        creator: Option<&str>,
    ) -> u64 {
        let id = self.next_id();
        let now = Utc::now();
        self.images.insert(
            id,
            Image {
                id,
                source: source.to_string(),
                identifier: identifier.to_string(),
                identifier_type: identifier_type.to_string(),
                description: description.to_string(),
                file: file.to_string(),
                creator: creator.map(|c| c.to_string()),
                created: now,
                updated: now,
            },
        );
        id
    }

    pub fn add_tag(&mut self, title: &str, description: &str) -> u64 {
        let id = self.next_id();
        self.tags.insert(
            id,
            Tag {
                id,
                slug: slugify(title),
                title: title.to_string(),
                description: description.to_string(),
            },
        );
        id
    }

    pub fn post(&self, id: u64) -> Option<&Post> {
        self.posts.get(&id)
    }

    pub fn note(&self, id: u64) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn image(&self, id: u64) -> Option<&Image> {
        self.images.get(&id)
    }

    pub fn tag(&self, id: u64) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Number of published posts carrying the given tag.
    pub fn num_published_posts(&self, tag: u64) -> usize {
        self.posts
            .values()
            .filter(|p| p.published && p.tags.contains(&tag))
            .count()
    }

    /// Whether the registry holds a record for an editorial (kind, id) pair.
    /// Entity and concept refs are resolved by the catalog, not here.
    pub fn contains(&self, reference: ContentRef) -> bool {
        match reference.kind {
            ContentKind::Post => self.posts.contains_key(&reference.id),
            ContentKind::Note => self.notes.contains_key(&reference.id),
            ContentKind::Image => self.images.contains_key(&reference.id),
            ContentKind::Entity | ContentKind::Concept => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Origins of Genecology"), "the-origins-of-genecology");
        assert_eq!(slugify("  Hybrid zones & clines!  "), "hybrid-zones-clines");
        let long = "x".repeat(200);
        assert_eq!(slugify(&long).len(), 100);
    }

    #[test]
    fn test_posts_get_slugs_and_tag_counts() {
        let mut registry = ContentRegistry::default();
        let tag = registry.add_tag("Field Notes", "notes from the field");
        let a = registry.add_post("First Survey", "", "body", Some("ada"));
        let b = registry.add_post("Second Survey", "", "body", Some("ada"));
        registry.tag_post(a, tag);
        registry.tag_post(b, tag);
        registry.publish_post(a);
        assert_eq!(registry.post(a).unwrap().slug, "first-survey");
        assert_eq!(registry.num_published_posts(tag), 1);
    }

    #[test]
    fn test_content_ref_round_trip() {
        let reference = ContentRef::from_str("post:12").unwrap();
        assert_eq!(reference, ContentRef::new(ContentKind::Post, 12));
        assert_eq!(reference.to_string(), "post:12");
        assert!(ContentRef::from_str("gadget:1").is_err());
        assert!(ContentRef::from_str("post").is_err());
    }

    #[test]
    fn test_registry_resolution_is_by_kind_and_id() {
        let mut registry = ContentRegistry::default();
        let note = registry.add_note("a note", None);
        assert!(registry.contains(ContentRef::new(ContentKind::Note, note)));
        assert!(!registry.contains(ContentRef::new(ContentKind::Post, note)));
    }
}
