//! Schema compiler: custom type → type declarations + path registry.
//!
//! The walk is a plain recursion over the field tree. Two parallel address
//! lists are threaded down: the structural path (what the registry stores,
//! including `data`/`primary`/`items`) and the named segments (what type
//! names are built from). Containers register after their descendants.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::declaration::{
    FieldDecl, FieldExtension, ObjectType, TypeDeclaration, TypeRef, UnionType,
};
use crate::error::{Result, SchemaError};
use crate::naming::{shared, TypeNaming, TypeRole, NODE_INTERFACE};
use crate::registry::{PathKind, PathRegistry, THUMBNAILS_SEGMENT};
use crate::resolver::FieldResolver;
use crate::types::{BlockDescriptor, CustomTypeSchema, FieldDescriptor, FieldMap};

/// Path segment holding every non-UID field of a document.
pub const DATA_SEGMENT: &str = "data";
/// Path segment of a slice's non-repeating half.
pub const PRIMARY_SEGMENT: &str = "primary";
/// Path segment of a slice's repeating half.
pub const ITEMS_SEGMENT: &str = "items";

/// Output of compiling one custom type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCustomType {
    pub custom_type_id: String,
    pub type_declarations: Vec<TypeDeclaration>,
    pub type_paths: PathRegistry,
}

impl CompiledCustomType {
    pub fn declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.type_declarations.iter().find(|decl| decl.name() == name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.declaration(name).and_then(TypeDeclaration::as_object)
    }
}

/// Compiles custom types under one naming policy.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    naming: TypeNaming,
}

impl SchemaCompiler {
    pub fn new(naming: TypeNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &TypeNaming {
        &self.naming
    }

    /// Compile a custom type.
    ///
    /// Fails only when the schema produces a duplicate path or type name.
    pub fn compile(
        &self,
        custom_type_id: &str,
        schema: &CustomTypeSchema,
    ) -> Result<CompiledCustomType> {
        let mut compilation = Compilation {
            naming: &self.naming,
            declarations: Vec::new(),
            type_names: HashSet::new(),
            registry: PathRegistry::new(),
        };

        let root_path = vec![custom_type_id.to_string()];
        let data_path = child(&root_path, DATA_SEGMENT);

        let mut uid: Option<(String, FieldDecl)> = None;
        let mut data = ObjectType::new(self.naming.namespaced(&root_path, TypeRole::Data));

        for (tab, fields) in schema.tabs() {
            debug!(custom_type = custom_type_id, tab, fields = fields.len(), "compiling tab");
            for (name, field) in fields {
                if field.is_uid() {
                    if let Some((first, _)) = &uid {
                        return Err(SchemaError::MultipleUids {
                            first: first.clone(),
                            second: name.clone(),
                        });
                    }
                    let decl = compilation.field(&child(&root_path, name), &root_path, field)?;
                    uid = Some((name.clone(), decl));
                } else {
                    let decl = compilation.field(
                        &child(&data_path, name),
                        &child(&root_path, name),
                        field,
                    )?;
                    data.fields.insert(name.clone(), decl);
                }
            }
        }

        let data_name = data.name.clone();
        compilation.declare(&data_path, data.into())?;
        compilation
            .registry
            .register(data_path, data_name.as_str(), PathKind::Data)?;

        let mut root = ObjectType::new(self.naming.document_type(custom_type_id))
            .implements(NODE_INTERFACE)
            .implements(self.naming.document_interface());
        if let Some((name, decl)) = uid {
            root.fields.insert(name, decl);
        }
        root = root.field(DATA_SEGMENT, TypeRef::named(data_name));

        let root_name = root.name.clone();
        compilation.declare(&root_path, root.into())?;
        compilation
            .registry
            .register(root_path, root_name, PathKind::Document)?;

        debug!(
            custom_type = custom_type_id,
            declarations = compilation.declarations.len(),
            paths = compilation.registry.len(),
            "compiled custom type"
        );

        Ok(CompiledCustomType {
            custom_type_id: custom_type_id.to_string(),
            type_declarations: compilation.declarations,
            type_paths: compilation.registry,
        })
    }
}

/// State owned by a single `compile` call.
struct Compilation<'a> {
    naming: &'a TypeNaming,
    declarations: Vec<TypeDeclaration>,
    type_names: HashSet<String>,
    registry: PathRegistry,
}

impl Compilation<'_> {
    fn declare(&mut self, path: &[String], decl: TypeDeclaration) -> Result<()> {
        if !self.type_names.insert(decl.name().to_string()) {
            return Err(SchemaError::DuplicateTypeName {
                name: decl.name().to_string(),
                path: path.join("."),
            });
        }
        self.declarations.push(decl);
        Ok(())
    }

    fn leaf(&mut self, path: &[String], type_ref: TypeRef, kind: PathKind) -> Result<FieldDecl> {
        self.registry
            .register(path.to_vec(), type_ref.to_string(), kind)?;
        Ok(FieldDecl::new(type_ref))
    }

    /// Compile one field at `path`. `names` are the named segments of the
    /// field's own address (custom type id first).
    fn field(
        &mut self,
        path: &[String],
        names: &[String],
        field: &FieldDescriptor,
    ) -> Result<FieldDecl> {
        let string = || TypeRef::named("String");
        match field {
            FieldDescriptor::Color { .. }
            | FieldDescriptor::Select { .. }
            | FieldDescriptor::Text { .. } => self.leaf(path, string(), PathKind::String),
            FieldDescriptor::Uid { .. } => self.leaf(path, string().non_null(), PathKind::Uid),
            FieldDescriptor::Boolean { .. } => {
                self.leaf(path, TypeRef::named("Boolean"), PathKind::Boolean)
            }
            FieldDescriptor::Number { .. } => {
                self.leaf(path, TypeRef::named("Float"), PathKind::Float)
            }
            FieldDescriptor::Date { .. } | FieldDescriptor::Timestamp { .. } => Ok(self
                .leaf(path, TypeRef::named("Date"), PathKind::Date)?
                .with_extension(FieldExtension::DateFormat)),
            FieldDescriptor::GeoPoint { .. } => {
                let name = self.naming.shared(shared::GEO_POINT);
                self.leaf(path, TypeRef::named(name), PathKind::GeoPoint)
            }
            FieldDescriptor::Embed { .. } => {
                let name = self.naming.shared(shared::EMBED);
                self.leaf(path, TypeRef::named(name), PathKind::Embed)
            }
            FieldDescriptor::StructuredText { .. } => {
                let name = self.naming.shared(shared::STRUCTURED_TEXT);
                self.leaf(path, TypeRef::named(name), PathKind::StructuredText)
            }
            FieldDescriptor::Link { .. } => {
                let name = self.naming.shared(shared::LINK);
                Ok(self
                    .leaf(path, TypeRef::named(name), PathKind::Link)?
                    .with_resolver(FieldResolver::LinkedDocument))
            }
            FieldDescriptor::Image { config } => {
                let name = self.naming.shared(shared::IMAGE);
                let decl = self.leaf(path, TypeRef::named(name), PathKind::Image)?;
                let thumbnail = self.naming.shared(shared::IMAGE_THUMBNAIL);
                for spec in &config.thumbnails {
                    let mut thumbnail_path = child(path, THUMBNAILS_SEGMENT);
                    thumbnail_path.push(spec.name.clone());
                    self.registry.register(
                        thumbnail_path,
                        thumbnail.as_str(),
                        PathKind::ImageThumbnail,
                    )?;
                }
                Ok(decl)
            }
            FieldDescriptor::Group { config } => {
                let object = self.object(path, names, TypeRole::Group, &config.fields, path)?;
                let type_ref = TypeRef::named(object).list();
                self.leaf(path, type_ref, PathKind::Group)
            }
            FieldDescriptor::Slices { config } => {
                let mut members = Vec::with_capacity(config.choices.len());
                for (choice, block) in &config.choices {
                    members.push(self.slice(&child(path, choice), &child(names, choice), block)?);
                }
                let union = UnionType {
                    name: self.naming.namespaced(names, TypeRole::Slices),
                    types: members,
                };
                let type_ref = TypeRef::named(union.name.clone()).list();
                self.declare(path, union.into())?;
                Ok(self
                    .leaf(path, type_ref, PathKind::Slices)?
                    .with_resolver(FieldResolver::SliceNodes))
            }
        }
    }

    /// Declare an object type named for `names`/`role` whose fields live under
    /// `fields_path`. Returns the type name.
    fn object(
        &mut self,
        path: &[String],
        names: &[String],
        role: TypeRole,
        fields: &FieldMap,
        fields_path: &[String],
    ) -> Result<String> {
        let mut object = ObjectType::new(self.naming.namespaced(names, role));
        for (name, field) in fields {
            let decl = self.field(&child(fields_path, name), &child(names, name), field)?;
            object.fields.insert(name.clone(), decl);
        }
        let name = object.name.clone();
        self.declare(path, object.into())?;
        Ok(name)
    }

    /// Compile one slice choice. Returns the choice's type name.
    fn slice(
        &mut self,
        path: &[String],
        names: &[String],
        block: &BlockDescriptor,
    ) -> Result<String> {
        let primary_path = child(path, PRIMARY_SEGMENT);
        let primary = self.object(
            &primary_path,
            names,
            TypeRole::SlicePrimary,
            &block.non_repeat_fields,
            &primary_path,
        )?;
        self.registry
            .register(primary_path, primary.as_str(), PathKind::SlicePrimary)?;

        let items_path = child(path, ITEMS_SEGMENT);
        let item = self.object(
            &items_path,
            names,
            TypeRole::SliceItem,
            &block.repeat_fields,
            &items_path,
        )?;
        let items_ref = TypeRef::named(item).list();
        self.registry
            .register(items_path, items_ref.to_string(), PathKind::SliceItems)?;

        let slice = ObjectType::new(self.naming.namespaced(names, TypeRole::Slice))
            .field("slice_type", TypeRef::named("String").non_null())
            .field("slice_label", TypeRef::named("String"))
            .field(PRIMARY_SEGMENT, TypeRef::named(primary))
            .field(ITEMS_SEGMENT, items_ref)
            .implements(NODE_INTERFACE);
        let name = slice.name.clone();
        self.declare(path, slice.into())?;
        self.registry
            .register(path.to_vec(), name.as_str(), PathKind::Slice)?;
        Ok(name)
    }
}

fn child(parent: &[String], segment: &str) -> Vec<String> {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(segment.to_string());
    path
}

/// Compile with the default naming policy.
pub fn compile(custom_type_id: &str, schema: &CustomTypeSchema) -> Result<CompiledCustomType> {
    SchemaCompiler::default().compile(custom_type_id, schema)
}
