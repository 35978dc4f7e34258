//! The field materialization walk.
//!
//! A raw document is walked key by key. Each key's path is looked up in the
//! registry and the value is materialized according to the registered kind.
//! Sibling keys are driven concurrently and reassembled in input order. A
//! field that fails degrades to `null` in its own slot; nothing below the
//! document root can fail the document.

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slicegraph_schema::registry::THUMBNAILS_SEGMENT;
use slicegraph_schema::{PathKind, PathRegistry};
use tracing::{debug, warn};

use crate::environment::{FetchRequest, FieldContext, FieldDiagnostic, ProxyEnvironment};
use crate::error::{json_kind, FieldError, ProxyError, Result};
use crate::link;
use crate::richtext;

/// Key of a slice's non-repeating half.
const PRIMARY: &str = "primary";
/// Key of a slice's repeating half.
const ITEMS: &str = "items";
/// Key naming the choice a slice was built from.
const SLICE_TYPE: &str = "slice_type";

/// A materialized document, ready to be stored as a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxiedDocument {
    pub node_id: String,
    pub document: Value,
}

/// Materialize `raw` against the registry compiled for its custom type.
pub async fn materialize(
    raw: &Value,
    paths: &PathRegistry,
    env: &ProxyEnvironment,
) -> Result<ProxiedDocument> {
    let Value::Object(fields) = raw else {
        return Err(ProxyError::InvalidDocument {
            found: json_kind(raw),
        });
    };
    let document_type = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProxyError::MissingDocumentType)?;
    let document_id = fields.get("id").and_then(Value::as_str).unwrap_or_default();
    let node_id = env.node_id(document_type, document_id);

    let walk = Walk {
        paths,
        env,
        document: raw,
        node_id: &node_id,
    };
    let root = vec![document_type.to_string()];
    let document = walk.record(&root, fields, false).await;

    debug!(
        document_type,
        document_id,
        node_id = %node_id,
        "materialized document"
    );

    Ok(ProxiedDocument {
        node_id,
        document: Value::Object(document),
    })
}

/// Read-only state shared by every field of one document.
struct Walk<'a> {
    paths: &'a PathRegistry,
    env: &'a ProxyEnvironment,
    document: &'a Value,
    node_id: &'a str,
}

impl<'a> Walk<'a> {
    /// Materialize every key of `record`. Field records (`transform`) get
    /// their keys renamed; lookups always use the raw key.
    async fn record(
        &self,
        parent: &[String],
        record: &Map<String, Value>,
        transform: bool,
    ) -> Map<String, Value> {
        let values = join_all(record.iter().map(|(key, value)| {
            let mut path = parent.to_vec();
            path.push(key.clone());
            self.value(path, key, value)
        }))
        .await;

        record
            .keys()
            .zip(values)
            .map(|(key, value)| {
                let key = if transform {
                    self.env.transform_field_name(key)
                } else {
                    key.clone()
                };
                (key, value)
            })
            .collect()
    }

    fn value<'s>(&'s self, path: Vec<String>, key: &'s str, value: &'s Value) -> BoxFuture<'s, Value> {
        async move {
            if value.is_null() {
                return Value::Null;
            }
            let Some(kind) = self.paths.kind_at(&path) else {
                return value.clone();
            };
            if kind.is_passthrough() {
                return value.clone();
            }
            let field = FieldContext {
                key,
                value,
                node: self.document,
            };

            match kind {
                PathKind::StructuredText => match self.structured_text(&field) {
                    Ok(value) => value,
                    Err(err) => self.degrade(path, kind, err),
                },
                PathKind::Link => match link::materialize(&field, self.env) {
                    Ok(value) => value,
                    Err(err) => self.degrade(path, kind, err),
                },
                PathKind::Image => self.image(&path, &field).await,
                PathKind::Data => match value {
                    Value::Object(record) => Value::Object(self.record(&path, record, true).await),
                    other => other.clone(),
                },
                PathKind::Group => match value {
                    Value::Array(records) => Value::Array(
                        join_all(records.iter().map(|record| self.field_record(&path, record))).await,
                    ),
                    other => other.clone(),
                },
                PathKind::Slices => match value {
                    Value::Array(slices) => Value::Array(
                        join_all(slices.iter().map(|slice| self.slice(&path, slice))).await,
                    ),
                    other => other.clone(),
                },
                // Structural kinds are materialized by their container.
                _ => value.clone(),
            }
        }
        .boxed()
    }

    /// A Group element or slice item: a field record when it is an object.
    async fn field_record(&self, path: &[String], value: &Value) -> Value {
        match value {
            Value::Object(record) => Value::Object(self.record(path, record, true).await),
            other => other.clone(),
        }
    }

    /// One slice of a slice zone. Envelope keys are kept as they are; the
    /// `primary` record and each `items` record are field records.
    async fn slice(&self, zone: &[String], value: &Value) -> Value {
        let Value::Object(slice) = value else {
            return value.clone();
        };
        let Some(choice) = slice.get(SLICE_TYPE).and_then(Value::as_str) else {
            return value.clone();
        };
        let mut choice_path = zone.to_vec();
        choice_path.push(choice.to_string());

        let halves = join_all(slice.iter().map(|(key, half)| {
            let mut path = choice_path.clone();
            path.push(key.clone());
            async move {
                match (key.as_str(), half) {
                    (PRIMARY, Value::Object(_)) => self.field_record(&path, half).await,
                    (ITEMS, Value::Array(items)) => Value::Array(
                        join_all(items.iter().map(|item| self.field_record(&path, item))).await,
                    ),
                    _ => half.clone(),
                }
            }
        }))
        .await;

        Value::Object(slice.keys().cloned().zip(halves).collect())
    }

    fn structured_text(&self, field: &FieldContext<'_>) -> std::result::Result<Value, FieldError> {
        let Value::Array(blocks) = field.value else {
            return Err(FieldError::InvalidValue {
                expected: "array of rich text blocks",
                found: json_kind(field.value),
            });
        };
        let html = richtext::as_html(
            blocks,
            field,
            self.env.link_resolver.as_ref(),
            self.env.html_serializer.as_ref(),
        )?;

        let mut proxied = Map::new();
        proxied.insert("html".to_string(), Value::String(html));
        proxied.insert("text".to_string(), Value::String(richtext::as_text(blocks)));
        proxied.insert("raw".to_string(), field.value.clone());
        Ok(Value::Object(proxied))
    }

    /// The image with its `localFile`, plus every registered thumbnail present
    /// on the value materialized the same way.
    async fn image(&self, path: &[String], field: &FieldContext<'_>) -> Value {
        let Value::Object(image) = field.value else {
            return field.value.clone();
        };

        let thumbnails: Vec<&str> = self
            .paths
            .thumbnail_names(path)
            .into_iter()
            .filter(|name| image.get(*name).is_some_and(Value::is_object))
            .collect();

        let main = self.local_file(path, field);
        let thumbs = join_all(thumbnails.iter().map(|name| async move {
            let mut thumb_path = path.to_vec();
            thumb_path.push(THUMBNAILS_SEGMENT.to_string());
            thumb_path.push(name.to_string());
            let value = &image[*name];
            let thumb = FieldContext {
                key: field.key,
                value,
                node: field.node,
            };
            with_local_file(value, self.local_file(&thumb_path, &thumb).await)
        }));
        let (local_file, thumbs) = futures::join!(main, thumbs);

        let mut proxied = match with_local_file(field.value, local_file) {
            Value::Object(proxied) => proxied,
            other => return other,
        };
        for (name, thumb) in thumbnails.into_iter().zip(thumbs) {
            proxied.insert(name.to_string(), thumb);
        }
        Value::Object(proxied)
    }

    /// Node id of the downloaded file, or `null` when the image is not
    /// normalized or the download fails.
    async fn local_file(&self, path: &[String], field: &FieldContext<'_>) -> Value {
        let Some(fetcher) = &self.env.file_fetcher else {
            return Value::Null;
        };
        let Some(url) = field.value.get("url").and_then(Value::as_str) else {
            return Value::Null;
        };
        if !self.env.image_normalization.should_normalize(field).await {
            return Value::Null;
        }

        let url = urlencoding::decode(url)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| url.to_string());
        let request = FetchRequest {
            url,
            parent_node_id: self.node_id.to_string(),
        };

        match fetcher.fetch(request).await {
            Ok(file) => Value::String(file.id),
            Err(err) => self.degrade(path.to_vec(), PathKind::Image, FieldError::Fetch(err)),
        }
    }

    /// Log a degraded field, report it on the diagnostics channel and return
    /// the `null` that takes its place.
    fn degrade(&self, path: Vec<String>, kind: PathKind, err: FieldError) -> Value {
        warn!(path = %path.join("."), ?kind, error = %err, "field degraded to null");
        if let Some(diagnostics) = &self.env.diagnostics {
            // A dropped receiver only means nobody is listening.
            let _ = diagnostics.send(FieldDiagnostic {
                path,
                kind,
                message: err.to_string(),
            });
        }
        Value::Null
    }
}

fn with_local_file(image: &Value, local_file: Value) -> Value {
    match image {
        Value::Object(fields) => {
            let mut proxied = fields.clone();
            proxied.insert("localFile".to_string(), local_file);
            Value::Object(proxied)
        }
        other => other.clone(),
    }
}
