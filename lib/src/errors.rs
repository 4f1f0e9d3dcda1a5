//! Typed errors surfaced by catalogue operations. IO and import plumbing use
//! `anyhow`; these variants are the failures callers are expected to match on.

use thiserror::Error;

/// Which end of a proposed relationship failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSide {
    Source,
    Target,
}

impl std::fmt::Display for RelationSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationSide::Source => write!(f, "source"),
            RelationSide::Target => write!(f, "target"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A referenced record id does not exist.
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// A class identifier could not be resolved.
    #[error("no class with identifier `{identifier}`")]
    UnknownClass { identifier: String },

    /// Domain/range mismatch on a proposed typed relationship. Never
    /// auto-corrected; the message names the offending side and the class the
    /// property expects there.
    #[error("{side} entity `{entity}` is a `{found}`, but property `{property}` requires its {side} to be a `{expected}` or a descendant of it")]
    Validation {
        side: RelationSide,
        entity: String,
        property: String,
        expected: String,
        found: String,
    },

    /// The class or property hierarchy would not terminate. Treated as a
    /// data-integrity fault; the offending edge is rejected.
    #[error("hierarchy contains a cycle through `{identifier}`")]
    CycleDetected { identifier: String },

    /// The schema document could not be parsed, even after retrying with an
    /// explicit format hint.
    #[error("could not parse RDF document at {location} in any supported format")]
    ImportParse { location: String },
}
