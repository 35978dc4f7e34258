//! Link fields.

use serde_json::{Map, Value};

use crate::environment::{FieldContext, LinkResolver, ProxyEnvironment};
use crate::error::{json_kind, FieldError};

/// `link_type` of a link pointing at another document.
pub const DOCUMENT_LINK: &str = "Document";

fn is_document_link(link: &Value) -> bool {
    link.get("link_type").and_then(Value::as_str) == Some(DOCUMENT_LINK)
}

/// URL of a link. Document links go through the resolver; web and media
/// links carry their own `url`; empty links have none.
pub fn url(
    link: &Value,
    field: &FieldContext<'_>,
    resolver: &dyn LinkResolver,
) -> Result<Option<String>, FieldError> {
    if is_document_link(link) {
        return resolver
            .resolve(field, link)
            .map_err(FieldError::LinkResolver);
    }
    Ok(link.get("url").and_then(Value::as_str).map(str::to_string))
}

/// Materialize a link: the original keys plus the resolved `url`, the linked
/// document's node id and the untouched `raw` value.
pub fn materialize(field: &FieldContext<'_>, env: &ProxyEnvironment) -> Result<Value, FieldError> {
    let Value::Object(fields) = field.value else {
        return Err(FieldError::InvalidValue {
            expected: "link object",
            found: json_kind(field.value),
        });
    };

    let url = url(field.value, field, env.link_resolver.as_ref())?;

    let document = match (
        is_document_link(field.value),
        fields.get("type").and_then(Value::as_str),
        fields.get("id").and_then(Value::as_str),
    ) {
        (true, Some(target_type), Some(target_id)) => {
            Value::String(env.node_id(target_type, target_id))
        }
        _ => Value::Null,
    };

    let mut proxied: Map<String, Value> = fields.clone();
    proxied.insert("url".to_string(), url.map_or(Value::Null, Value::String));
    proxied.insert("document".to_string(), document);
    proxied.insert("raw".to_string(), field.value.clone());
    Ok(Value::Object(proxied))
}
