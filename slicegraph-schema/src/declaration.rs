//! Compiled type declarations and their SDL rendering.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::resolver::FieldResolver;

/// Reference to a type from a field: a name, possibly wrapped in list and
/// non-null modifiers. Serializes in SDL notation (`[Foo]!`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// The innermost type name.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.base_name(),
        }
    }

    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Error returned when a type reference string is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTypeRefError(String);

impl fmt::Display for ParseTypeRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed type reference '{}'", self.0)
    }
}

impl std::error::Error for ParseTypeRefError {}

impl FromStr for TypeRef {
    type Err = ParseTypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('!') {
            return Ok(inner.parse::<TypeRef>()?.non_null());
        }
        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| ParseTypeRefError(s.to_string()))?;
            return Ok(inner.parse::<TypeRef>()?.list());
        }
        let valid = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self::named(s))
        } else {
            Err(ParseTypeRefError(s.to_string()))
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Field-level extensions understood by the downstream query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldExtension {
    /// Date field accepting formatting arguments
    DateFormat,
}

impl FieldExtension {
    fn directive(self) -> &'static str {
        match self {
            Self::DateFormat => "@dateformat",
        }
    }
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<FieldExtension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<FieldResolver>,
}

impl FieldDecl {
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            extensions: Vec::new(),
            resolver: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TypeRef::named(name))
    }

    pub fn with_extension(mut self, extension: FieldExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl From<TypeRef> for FieldDecl {
    fn from(type_ref: TypeRef) -> Self {
        Self::new(type_ref)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub fields: IndexMap<String, FieldDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, decl: impl Into<FieldDecl>) -> Self {
        self.fields.insert(name.into(), decl.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    pub fn has_interface(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceType {
    pub name: String,
    pub fields: IndexMap<String, FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub name: String,
    pub types: Vec<String>,
}

/// Serialization behaviour of a custom scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarBehavior {
    /// Serializes every value to `null`
    AlwaysNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarType {
    pub name: String,
    pub behavior: ScalarBehavior,
}

impl ScalarType {
    pub fn serialize(&self, _value: &Value) -> Value {
        match self.behavior {
            ScalarBehavior::AlwaysNull => Value::Null,
        }
    }
}

/// A named type produced by compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDeclaration {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Scalar(ScalarType),
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(t) => &t.name,
            Self::Interface(t) => &t.name,
            Self::Union(t) => &t.name,
            Self::Scalar(t) => &t.name,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            Self::Union(union) => Some(union),
            _ => None,
        }
    }
}

impl From<ObjectType> for TypeDeclaration {
    fn from(object: ObjectType) -> Self {
        Self::Object(object)
    }
}

impl From<UnionType> for TypeDeclaration {
    fn from(union: UnionType) -> Self {
        Self::Union(union)
    }
}

impl From<InterfaceType> for TypeDeclaration {
    fn from(interface: InterfaceType) -> Self {
        Self::Interface(interface)
    }
}

impl From<ScalarType> for TypeDeclaration {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &IndexMap<String, FieldDecl>) -> fmt::Result {
    writeln!(f, " {{")?;
    for (name, decl) in fields {
        write!(f, "  {name}: {}", decl.type_ref)?;
        for extension in &decl.extensions {
            write!(f, " {}", extension.directive())?;
        }
        writeln!(f)?;
    }
    write!(f, "}}")
}

impl fmt::Display for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(object) => {
                write!(f, "type {}", object.name)?;
                if !object.interfaces.is_empty() {
                    write!(f, " implements {}", object.interfaces.join(" & "))?;
                }
                write_fields(f, &object.fields)
            }
            Self::Interface(interface) => {
                write!(f, "interface {}", interface.name)?;
                write_fields(f, &interface.fields)
            }
            Self::Union(union) => write!(f, "union {} = {}", union.name, union.types.join(" | ")),
            Self::Scalar(scalar) => write!(f, "scalar {}", scalar.name),
        }
    }
}

/// Render declarations as one SDL document.
pub fn to_sdl<'a>(declarations: impl IntoIterator<Item = &'a TypeDeclaration>) -> String {
    declarations
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}
