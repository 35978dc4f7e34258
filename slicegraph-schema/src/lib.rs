//! Custom type compiler and type path registry
//!
//! `slicegraph-schema` turns a headless-CMS custom type description into named
//! type declarations for a downstream query engine, plus the path registry the
//! materialization engine uses to interpret raw documents.
//!
//! # Architecture
//!
//! - **Pure compile**: `compile` is a function of the custom type id, the schema
//!   and the naming policy. Same input, byte-identical output
//! - **Paths, not names**: the registry maps structural paths to types and
//!   kinds, so consumers never parse generated names
//! - **Serialisable output**: declarations and registries round-trip through
//!   JSON and can be cached between runs
//! - **Cross-type collection**: the document union and thumbnails type are
//!   collected once every custom type is compiled

pub mod collect;
pub mod compiler;
pub mod declaration;
pub mod error;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod types;

pub use collect::{collect_document_union, collect_image_thumbnails_type, shared_type_declarations};
pub use compiler::{compile, CompiledCustomType, SchemaCompiler};
pub use declaration::{
    to_sdl, FieldDecl, FieldExtension, InterfaceType, ObjectType, ScalarBehavior, ScalarType,
    TypeDeclaration, TypeRef, UnionType,
};
pub use error::{Result, SchemaError};
pub use naming::{TypeNaming, TypeRole, DEFAULT_TYPE_PREFIX};
pub use registry::{path_of, PathEntry, PathKind, PathRegistry};
pub use resolver::{FieldResolver, NodeIdBuilder, NodeModel, ResolveContext};
pub use types::{
    BlockDescriptor, CustomTypeSchema, FieldDescriptor, FieldMap, ThumbnailSpec,
};
