//! Configuration values

use std::path::PathBuf;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ConfigResult;

/// How raw field names are exposed downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldNameStyle {
    /// Keep the CMS field name
    #[default]
    Preserve,
    /// `snake_case` becomes `camelCase`
    Camel,
}

impl FieldNameStyle {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Preserve => name.to_string(),
            Self::Camel => name.to_case(Case::Camel),
        }
    }
}

/// Default bound on simultaneous image downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// Image download settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Download images into the cache directory
    pub normalize: bool,
    pub cache_dir: PathBuf,
    pub max_concurrent_downloads: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            normalize: false,
            cache_dir: PathBuf::from(".slicegraph/cache"),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicegraphConfig {
    /// Prefix of every generated type name
    pub type_prefix: String,
    pub field_names: FieldNameStyle,
    pub images: ImageSettings,
}

impl Default for SlicegraphConfig {
    fn default() -> Self {
        Self {
            type_prefix: "Prismic".to_string(),
            field_names: FieldNameStyle::default(),
            images: ImageSettings::default(),
        }
    }
}

impl SlicegraphConfig {
    /// Reject values that would produce invalid type names or stall downloads.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_type_prefix(&self.type_prefix)?;
        if self.images.max_concurrent_downloads == 0 {
            return Err(ConfigError::invalid_value(
                "images.max_concurrent_downloads",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A type prefix must keep generated names valid GraphQL identifiers: ASCII
/// letters and digits, not starting with a digit. The empty prefix is valid.
pub fn validate_type_prefix(prefix: &str) -> ConfigResult<()> {
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::invalid_value(
            "type_prefix",
            format!("'{prefix}' must contain only ASCII letters and digits"),
        ));
    }
    if prefix.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(ConfigError::invalid_value(
            "type_prefix",
            format!("'{prefix}' must not start with a digit"),
        ));
    }
    Ok(())
}
