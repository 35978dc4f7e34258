//! Field resolvers attached to compiled declarations.
//!
//! Declarations stay plain data; the behaviour behind a resolver runs against
//! a [`ResolveContext`] supplied by whoever serves the compiled types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::naming::{TypeNaming, TypeRole};

/// Builds the node id of a document (or any typed record) from its type and id.
pub trait NodeIdBuilder: Send + Sync {
    fn node_id(&self, type_name: &str, id: &str) -> String;
}

impl<F> NodeIdBuilder for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn node_id(&self, type_name: &str, id: &str) -> String {
        self(type_name, id)
    }
}

/// Node lookup exposed by the host's node store.
pub trait NodeModel {
    fn get_node_by_id(&self, id: &str, type_name: Option<&str>) -> Option<Value>;

    /// Nodes for `ids`, positionally aligned; missing nodes are `None`.
    fn get_nodes_by_ids(&self, ids: &[String]) -> Vec<Option<Value>>;
}

/// Everything a resolver needs at query time.
pub struct ResolveContext<'a> {
    pub node_model: &'a dyn NodeModel,
    pub node_ids: &'a dyn NodeIdBuilder,
    pub naming: &'a TypeNaming,
}

/// Resolver attached to a field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldResolver {
    /// Replace a document link's `document` with the linked node
    LinkedDocument,
    /// Dereference slice node ids to their nodes
    SliceNodes,
    /// Expose the image itself so thumbnail fields read its keys
    ImageThumbnails,
}

impl FieldResolver {
    /// Resolve `field` on `parent`.
    pub fn resolve(&self, parent: &Value, field: &str, ctx: &ResolveContext<'_>) -> Value {
        match self {
            Self::LinkedDocument => resolve_linked_document(parent.get(field), ctx),
            Self::SliceNodes => resolve_slice_nodes(parent.get(field), ctx),
            Self::ImageThumbnails => parent.clone(),
        }
    }
}

/// Plain property lookup used by fields without a resolver. Absent keys
/// resolve to `null`.
pub fn resolve_property(parent: &Value, field: &str) -> Value {
    parent.get(field).cloned().unwrap_or(Value::Null)
}

fn resolve_linked_document(link: Option<&Value>, ctx: &ResolveContext<'_>) -> Value {
    let Some(link) = link else {
        return Value::Null;
    };
    let Some(fields) = link.as_object() else {
        return link.clone();
    };

    let is_document = fields
        .get("link_type")
        .and_then(Value::as_str)
        .map_or(true, |kind| kind == "Document");
    let target_type = fields.get("type").and_then(Value::as_str);
    let target_id = fields.get("id").and_then(Value::as_str);

    let (true, Some(target_type), Some(target_id)) = (is_document, target_type, target_id) else {
        return link.clone();
    };

    let node_id = ctx.node_ids.node_id(target_type, target_id);
    let type_name = ctx.naming.namespaced(&[target_type], TypeRole::Document);
    let document = ctx
        .node_model
        .get_node_by_id(&node_id, Some(&type_name))
        .unwrap_or(Value::Null);

    let mut resolved: Map<String, Value> = fields.clone();
    resolved.insert("document".to_string(), document);
    Value::Object(resolved)
}

fn resolve_slice_nodes(slices: Option<&Value>, ctx: &ResolveContext<'_>) -> Value {
    let Some(elements) = slices.and_then(Value::as_array) else {
        return Value::Null;
    };

    let ids: Vec<String> = elements
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    let fetched = if ids.is_empty() {
        Vec::new()
    } else {
        ctx.node_model.get_nodes_by_ids(&ids)
    };
    let mut nodes = fetched.into_iter();

    let resolved = elements
        .iter()
        .map(|element| match element {
            Value::String(_) => nodes.next().flatten().unwrap_or(Value::Null),
            inline => inline.clone(),
        })
        .collect();
    Value::Array(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryNodes {
        nodes: HashMap<String, Value>,
        lookups: RefCell<Vec<(String, Option<String>)>>,
    }

    impl NodeModel for MemoryNodes {
        fn get_node_by_id(&self, id: &str, type_name: Option<&str>) -> Option<Value> {
            self.lookups
                .borrow_mut()
                .push((id.to_string(), type_name.map(str::to_string)));
            self.nodes.get(id).cloned()
        }

        fn get_nodes_by_ids(&self, ids: &[String]) -> Vec<Option<Value>> {
            ids.iter().map(|id| self.nodes.get(id).cloned()).collect()
        }
    }

    fn node_id(type_name: &str, id: &str) -> String {
        format!("{type_name} {id}")
    }

    #[test]
    fn test_linked_document_lookup() {
        let mut model = MemoryNodes::default();
        model
            .nodes
            .insert("custom_type id".into(), json!({ "id": "custom_type id" }));
        let naming = TypeNaming::default();
        let ctx = ResolveContext {
            node_model: &model,
            node_ids: &node_id,
            naming: &naming,
        };

        let parent = json!({ "link": { "id": "id", "type": "custom_type" } });
        let resolved = FieldResolver::LinkedDocument.resolve(&parent, "link", &ctx);

        assert_eq!(resolved["document"], json!({ "id": "custom_type id" }));
        assert_eq!(
            model.lookups.borrow().as_slice(),
            &[("custom_type id".to_string(), Some("PrismicCustomType".to_string()))]
        );
    }

    #[test]
    fn test_web_link_passes_through() {
        let model = MemoryNodes::default();
        let naming = TypeNaming::default();
        let ctx = ResolveContext {
            node_model: &model,
            node_ids: &node_id,
            naming: &naming,
        };

        let parent = json!({ "link": { "link_type": "Web", "url": "https://example.com" } });
        let resolved = FieldResolver::LinkedDocument.resolve(&parent, "link", &ctx);

        assert_eq!(resolved, parent["link"]);
        assert!(model.lookups.borrow().is_empty());
    }

    #[test]
    fn test_slice_nodes_preserve_order() {
        let mut model = MemoryNodes::default();
        model.nodes.insert("id1".into(), json!({ "n": 1 }));
        model.nodes.insert("id2".into(), json!({ "n": 2 }));
        let naming = TypeNaming::default();
        let ctx = ResolveContext {
            node_model: &model,
            node_ids: &node_id,
            naming: &naming,
        };

        let parent = json!({ "body": ["id1", { "slice_type": "inline" }, "id2", "missing"] });
        let resolved = FieldResolver::SliceNodes.resolve(&parent, "body", &ctx);

        assert_eq!(
            resolved,
            json!([{ "n": 1 }, { "slice_type": "inline" }, { "n": 2 }, null])
        );
    }

    #[test]
    fn test_image_thumbnails_and_property_fallback() {
        let model = MemoryNodes::default();
        let naming = TypeNaming::default();
        let ctx = ResolveContext {
            node_model: &model,
            node_ids: &node_id,
            naming: &naming,
        };

        let image = json!({ "url": "a.png", "mobile": { "url": "m.png" } });
        let thumbnails = FieldResolver::ImageThumbnails.resolve(&image, "thumbnails", &ctx);
        assert_eq!(resolve_property(&thumbnails, "mobile"), json!({ "url": "m.png" }));
        assert_eq!(resolve_property(&thumbnails, "square"), Value::Null);
    }
}
