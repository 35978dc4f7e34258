//! Custom type model as published by the CMS.
//!
//! A custom type is an ordered map of tabs, each an ordered map of field
//! descriptors. Field descriptors are tagged by `type` and carry a
//! kind-specific `config` object. Insertion order is the canonical traversal
//! order, so every map here is an `IndexMap`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Ordered mapping from field name to descriptor.
pub type FieldMap = IndexMap<String, FieldDescriptor>;

/// A full custom type: tab name → field name → descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CustomTypeSchema {
    tabs: IndexMap<String, FieldMap>,
}

impl CustomTypeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a custom type from its JSON model.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert an already-parsed JSON model.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Append a tab. Replaces the fields of an existing tab with the same name.
    pub fn with_tab(mut self, name: impl Into<String>, fields: FieldMap) -> Self {
        self.tabs.insert(name.into(), fields);
        self
    }

    /// Tabs in declaration order.
    pub fn tabs(&self) -> impl Iterator<Item = (&str, &FieldMap)> {
        self.tabs.iter().map(|(name, fields)| (name.as_str(), fields))
    }

    /// Every field across all tabs, in traversal order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.tabs
            .values()
            .flat_map(|fields| fields.iter().map(|(name, field)| (name.as_str(), field)))
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.values().all(IndexMap::is_empty)
    }
}

/// Settings a field carries that do not affect its compiled shape
/// (labels, placeholders, select options, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named thumbnail rendition of an image field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThumbnailSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnails: Vec<ThumbnailSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupConfig {
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlicesConfig {
    #[serde(default)]
    pub choices: IndexMap<String, BlockDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One choice of a slice zone: a non-repeating half and a repeating half.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockDescriptor {
    #[serde(rename = "non-repeat", default)]
    pub non_repeat_fields: FieldMap,
    #[serde(rename = "repeat", default)]
    pub repeat_fields: FieldMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The kind of a field. Determines its compiled type and how its values
/// are materialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FieldDescriptor {
    Color {
        #[serde(default)]
        config: FieldConfig,
    },
    Select {
        #[serde(default)]
        config: FieldConfig,
    },
    Text {
        #[serde(default)]
        config: FieldConfig,
    },
    #[serde(rename = "UID")]
    Uid {
        #[serde(default)]
        config: FieldConfig,
    },
    Number {
        #[serde(default)]
        config: FieldConfig,
    },
    Date {
        #[serde(default)]
        config: FieldConfig,
    },
    Timestamp {
        #[serde(default)]
        config: FieldConfig,
    },
    Boolean {
        #[serde(default)]
        config: FieldConfig,
    },
    GeoPoint {
        #[serde(default)]
        config: FieldConfig,
    },
    Embed {
        #[serde(default)]
        config: FieldConfig,
    },
    StructuredText {
        #[serde(default)]
        config: FieldConfig,
    },
    Image {
        #[serde(default)]
        config: ImageConfig,
    },
    Link {
        #[serde(default)]
        config: FieldConfig,
    },
    Group {
        #[serde(default)]
        config: GroupConfig,
    },
    Slices {
        #[serde(default)]
        config: SlicesConfig,
    },
}

impl FieldDescriptor {
    /// The CMS tag for this kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Color { .. } => "Color",
            Self::Select { .. } => "Select",
            Self::Text { .. } => "Text",
            Self::Uid { .. } => "UID",
            Self::Number { .. } => "Number",
            Self::Date { .. } => "Date",
            Self::Timestamp { .. } => "Timestamp",
            Self::Boolean { .. } => "Boolean",
            Self::GeoPoint { .. } => "GeoPoint",
            Self::Embed { .. } => "Embed",
            Self::StructuredText { .. } => "StructuredText",
            Self::Image { .. } => "Image",
            Self::Link { .. } => "Link",
            Self::Group { .. } => "Group",
            Self::Slices { .. } => "Slices",
        }
    }

    pub fn is_uid(&self) -> bool {
        matches!(self, Self::Uid { .. })
    }

    pub fn text() -> Self {
        Self::Text {
            config: FieldConfig::default(),
        }
    }

    pub fn uid() -> Self {
        Self::Uid {
            config: FieldConfig::default(),
        }
    }

    pub fn image(thumbnails: Vec<ThumbnailSpec>) -> Self {
        Self::Image {
            config: ImageConfig {
                thumbnails,
                extra: Map::new(),
            },
        }
    }

    pub fn group(fields: FieldMap) -> Self {
        Self::Group {
            config: GroupConfig {
                fields,
                extra: Map::new(),
            },
        }
    }

    pub fn slices(choices: IndexMap<String, BlockDescriptor>) -> Self {
        Self::Slices {
            config: SlicesConfig {
                choices,
                extra: Map::new(),
            },
        }
    }
}
