//! Deterministic type naming.
//!
//! Generated names are a pure function of the prefix, the named segments of a
//! path and the structural role of the type at that path. Downstream caches key
//! on these names, so the rules here must not drift.

use convert_case::{Case, Casing};

/// Prefix used when none is configured.
pub const DEFAULT_TYPE_PREFIX: &str = "Prismic";

/// Interface implemented by document roots and slices.
pub const NODE_INTERFACE: &str = "Node";

/// Unprefixed names of the types shared by every custom type.
pub mod shared {
    pub const DOCUMENT: &str = "Document";
    pub const ALL_DOCUMENT_TYPES: &str = "AllDocumentTypes";
    pub const STRUCTURED_TEXT: &str = "StructuredTextType";
    pub const GEO_POINT: &str = "GeoPointType";
    pub const EMBED: &str = "EmbedType";
    pub const LINK: &str = "LinkType";
    pub const IMAGE: &str = "ImageType";
    pub const IMAGE_DIMENSIONS: &str = "ImageDimensionsType";
    pub const IMAGE_THUMBNAIL: &str = "ImageThumbnailType";
    pub const IMAGE_THUMBNAILS: &str = "ImageThumbnailsType";
}

/// Structural role of a generated type; selects the name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRole {
    Document,
    Data,
    Group,
    Slice,
    SlicePrimary,
    SliceItem,
    Slices,
}

impl TypeRole {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Document => "",
            Self::Data => "DataType",
            Self::Group => "GroupType",
            Self::Slice => "Slice",
            Self::SlicePrimary => "PrimaryType",
            Self::SliceItem => "ItemType",
            Self::Slices => "SlicesType",
        }
    }
}

/// PascalCase a single path segment (`custom_type` → `CustomType`).
pub fn pascal_case(segment: &str) -> String {
    segment.to_case(Case::Pascal)
}

/// Naming policy for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNaming {
    prefix: String,
}

impl TypeNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name of the type at a path, given the path's named segments
    /// (custom type id first, structural segments already removed).
    pub fn namespaced<S: AsRef<str>>(&self, segments: &[S], role: TypeRole) -> String {
        let mut name = self.prefix.clone();
        for segment in segments {
            name.push_str(&pascal_case(segment.as_ref()));
        }
        name.push_str(role.suffix());
        name
    }

    /// Name of a shared type, e.g. `shared::LINK` → `PrismicLinkType`.
    pub fn shared(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Root type name of a custom type.
    pub fn document_type(&self, custom_type_id: &str) -> String {
        self.namespaced(&[custom_type_id], TypeRole::Document)
    }

    /// The document capability interface name.
    pub fn document_interface(&self) -> String {
        self.shared(shared::DOCUMENT)
    }
}

impl Default for TypeNaming {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_PREFIX)
    }
}
