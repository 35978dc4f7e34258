//! The path registry: structural path → resolved type.
//!
//! Built once per compilation and persisted next to the compiled
//! declarations. Entries keep their registration order; lookups go through
//! an in-memory index keyed by the full path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, SchemaError};

/// Segment under which image thumbnails are registered.
pub const THUMBNAILS_SEGMENT: &str = "thumbnails";

/// How the value at a path is shaped and materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    String,
    Uid,
    Boolean,
    Float,
    Date,
    GeoPoint,
    Embed,
    StructuredText,
    Image,
    ImageThumbnail,
    Link,
    Group,
    Slices,
    Slice,
    SlicePrimary,
    SliceItems,
    Data,
    Document,
}

impl PathKind {
    /// Kinds whose values pass through materialization untouched.
    pub fn is_passthrough(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Uid
                | Self::Boolean
                | Self::Float
                | Self::Date
                | Self::GeoPoint
                | Self::Embed
        )
    }
}

/// One registered path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub kind: PathKind,
}

impl PathEntry {
    /// Dotted form used in logs and errors.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// Append-only, order-preserving index of type paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PathEntry>", into = "Vec<PathEntry>")]
pub struct PathRegistry {
    entries: Vec<PathEntry>,
    index: HashMap<Vec<String>, usize>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A path may only be registered once.
    pub fn register(
        &mut self,
        path: Vec<String>,
        type_name: impl Into<String>,
        kind: PathKind,
    ) -> Result<()> {
        if self.index.contains_key(&path) {
            return Err(SchemaError::DuplicatePath {
                path: path.join("."),
            });
        }

        let entry = PathEntry {
            path,
            type_name: type_name.into(),
            kind,
        };
        trace!(path = %entry.dotted(), type_name = %entry.type_name, ?kind, "registered type path");

        self.index.insert(entry.path.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, path: &[String]) -> Option<&PathEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    pub fn kind_at(&self, path: &[String]) -> Option<PathKind> {
        self.get(path).map(|entry| entry.kind)
    }

    /// Thumbnail names registered directly under an image path, in
    /// registration order.
    pub fn thumbnail_names(&self, image_path: &[String]) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == PathKind::ImageThumbnail)
            .filter(|entry| {
                entry.path.len() == image_path.len() + 2
                    && entry.path.starts_with(image_path)
                    && entry.path[image_path.len()] == THUMBNAILS_SEGMENT
            })
            .filter_map(|entry| entry.path.last().map(String::as_str))
            .collect()
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for PathRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PathRegistry {}

/// Rebuilds the index. Persisted registries with a repeated path keep the
/// first occurrence.
impl From<Vec<PathEntry>> for PathRegistry {
    fn from(entries: Vec<PathEntry>) -> Self {
        let mut registry = PathRegistry::new();
        for entry in entries {
            if registry.index.contains_key(&entry.path) {
                continue;
            }
            registry
                .index
                .insert(entry.path.clone(), registry.entries.len());
            registry.entries.push(entry);
        }
        registry
    }
}

impl From<PathRegistry> for Vec<PathEntry> {
    fn from(registry: PathRegistry) -> Self {
        registry.entries
    }
}

impl<'a> IntoIterator for &'a PathRegistry {
    type Item = &'a PathEntry;
    type IntoIter = std::slice::Iter<'a, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build an owned path from string slices.
pub fn path_of<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    segments.iter().map(|s| s.as_ref().to_string()).collect()
}
