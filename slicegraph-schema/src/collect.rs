//! Declarations that span custom types.
//!
//! These run after every custom type has been compiled: the document union
//! and the thumbnails type depend on the whole set, and the shared types are
//! emitted once regardless of how many custom types exist.

use std::collections::HashSet;

use tracing::debug;

use crate::declaration::{
    FieldDecl, FieldExtension, InterfaceType, ObjectType, ScalarBehavior, ScalarType,
    TypeDeclaration, TypeRef, UnionType,
};
use crate::naming::{shared, TypeNaming, NODE_INTERFACE};
use crate::registry::{PathEntry, PathKind};
use crate::resolver::FieldResolver;

/// Union of every object that implements both `Node` and the document
/// interface, in declaration order.
pub fn collect_document_union<'a>(
    declarations: impl IntoIterator<Item = &'a TypeDeclaration>,
    naming: &TypeNaming,
) -> UnionType {
    let document = naming.document_interface();
    let types: Vec<String> = declarations
        .into_iter()
        .filter_map(TypeDeclaration::as_object)
        .filter(|object| object.has_interface(NODE_INTERFACE) && object.has_interface(&document))
        .map(|object| object.name.clone())
        .collect();

    debug!(documents = types.len(), "collected document union");
    UnionType {
        name: naming.shared(shared::ALL_DOCUMENT_TYPES),
        types,
    }
}

/// The type of an image's `thumbnails` field: one field per distinct
/// thumbnail name across all registered paths. With no thumbnails at all the
/// type degrades to a scalar that always serializes to `null`.
pub fn collect_image_thumbnails_type<'a>(
    entries: impl IntoIterator<Item = &'a PathEntry>,
    naming: &TypeNaming,
) -> TypeDeclaration {
    let name = naming.shared(shared::IMAGE_THUMBNAILS);
    let thumbnail = naming.shared(shared::IMAGE_THUMBNAIL);

    let mut seen = HashSet::new();
    let mut object = ObjectType::new(name.clone());
    for entry in entries {
        if entry.kind != PathKind::ImageThumbnail {
            continue;
        }
        if let Some(thumb) = entry.path.last() {
            if seen.insert(thumb.clone()) {
                object = object.field(thumb.clone(), TypeRef::named(thumbnail.clone()));
            }
        }
    }

    if object.fields.is_empty() {
        ScalarType {
            name,
            behavior: ScalarBehavior::AlwaysNull,
        }
        .into()
    } else {
        object.into()
    }
}

fn string() -> TypeRef {
    TypeRef::named("String")
}

fn int() -> TypeRef {
    TypeRef::named("Int")
}

fn json() -> TypeRef {
    TypeRef::named("JSON")
}

/// Types every custom type refers to by name.
pub fn shared_type_declarations(naming: &TypeNaming) -> Vec<TypeDeclaration> {
    let date = || FieldDecl::named("Date").with_extension(FieldExtension::DateFormat);

    let document = InterfaceType {
        name: naming.document_interface(),
        fields: [
            ("id", FieldDecl::new(TypeRef::named("ID").non_null())),
            ("prismicId", FieldDecl::new(TypeRef::named("ID").non_null())),
            ("type", FieldDecl::new(string().non_null())),
            ("href", FieldDecl::new(string())),
            ("lang", FieldDecl::new(string())),
            ("tags", FieldDecl::new(string().non_null().list())),
            ("first_publication_date", date()),
            ("last_publication_date", date()),
        ]
        .into_iter()
        .map(|(name, decl)| (name.to_string(), decl))
        .collect(),
    };

    let structured_text = ObjectType::new(naming.shared(shared::STRUCTURED_TEXT))
        .field("html", string())
        .field("text", string())
        .field("raw", json());

    let geo_point = ObjectType::new(naming.shared(shared::GEO_POINT))
        .field("latitude", TypeRef::named("Float"))
        .field("longitude", TypeRef::named("Float"));

    let mut embed = ObjectType::new(naming.shared(shared::EMBED));
    for name in [
        "author_name",
        "author_url",
        "cache_age",
        "embed_url",
        "html",
        "name",
        "provider_name",
        "provider_url",
        "thumbnail_url",
        "title",
        "type",
        "version",
    ] {
        embed = embed.field(name, string());
    }
    for name in ["height", "width", "thumbnail_height", "thumbnail_width"] {
        embed = embed.field(name, int());
    }

    let dimensions = ObjectType::new(naming.shared(shared::IMAGE_DIMENSIONS))
        .field("width", int())
        .field("height", int());

    let thumbnail = ObjectType::new(naming.shared(shared::IMAGE_THUMBNAIL))
        .field("alt", string())
        .field("copyright", string())
        .field("dimensions", TypeRef::named(dimensions.name.clone()))
        .field("url", string())
        .field("localFile", TypeRef::named("File"));

    let image = ObjectType::new(naming.shared(shared::IMAGE))
        .field("alt", string())
        .field("copyright", string())
        .field("dimensions", TypeRef::named(dimensions.name.clone()))
        .field("url", string())
        .field("localFile", TypeRef::named("File"))
        .field(
            "thumbnails",
            FieldDecl::named(naming.shared(shared::IMAGE_THUMBNAILS))
                .with_resolver(FieldResolver::ImageThumbnails),
        );

    let link = ObjectType::new(naming.shared(shared::LINK))
        .field("link_type", string())
        .field("isBroken", TypeRef::named("Boolean"))
        .field("url", string())
        .field("target", string())
        .field("size", int())
        .field("id", TypeRef::named("ID"))
        .field("type", string())
        .field("tags", string().list())
        .field("lang", string())
        .field("slug", string())
        .field("uid", string())
        .field(
            "document",
            TypeRef::named(naming.shared(shared::ALL_DOCUMENT_TYPES)),
        )
        .field("raw", json());

    vec![
        document.into(),
        structured_text.into(),
        geo_point.into(),
        embed.into(),
        dimensions.into(),
        thumbnail.into(),
        image.into(),
        link.into(),
    ]
}
