use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use slicegraph_proxy::{
    materialize, FetchRequest, FieldContext, FileNode, LinkResolver, NormalizeImages, ProxyEnvironment,
    ProxyError, RemoteFileFetcher,
};
use slicegraph_schema::{compile, CustomTypeSchema, PathKind, PathRegistry};

fn node_id(type_name: &str, id: &str) -> String {
    format!("{type_name} {id}")
}

fn registry(id: &str, schema: Value) -> PathRegistry {
    let schema = CustomTypeSchema::from_value(schema).unwrap();
    compile(id, &schema).unwrap().type_paths
}

fn page_registry() -> PathRegistry {
    registry(
        "page",
        json!({
            "Main": {
                "uid": { "type": "UID" },
                "title": { "type": "StructuredText" },
                "cta_link": { "type": "Link" },
                "hero_image": {
                    "type": "Image",
                    "config": { "thumbnails": [ { "name": "mobile" } ] }
                },
                "feature_list": {
                    "type": "Group",
                    "config": { "fields": {
                        "feature_name": { "type": "Text" },
                        "feature_link": { "type": "Link" }
                    } }
                },
                "body": {
                    "type": "Slices",
                    "config": { "choices": {
                        "quote": {
                            "type": "Slice",
                            "non-repeat": { "quote_text": { "type": "StructuredText" } },
                            "repeat": { "author_name": { "type": "Text" } }
                        }
                    } }
                }
            }
        }),
    )
}

fn page_document() -> Value {
    json!({
        "id": "XyZ",
        "uid": "home",
        "type": "page",
        "href": "https://cms.example.com/documents/XyZ",
        "tags": ["landing"],
        "data": {
            "title": [ { "type": "heading1", "text": "Welcome", "spans": [] } ],
            "cta_link": { "link_type": "Document", "type": "page", "id": "abc", "uid": "about" },
            "hero_image": {
                "url": "https://images.example.com/hero%20shot.png",
                "alt": "Hero",
                "mobile": { "url": "https://images.example.com/hero-mobile.png" }
            },
            "feature_list": [
                { "feature_name": "Fast", "feature_link": { "link_type": "Web", "url": "https://fast.example.com" } },
                { "feature_name": "Safe", "feature_link": null }
            ],
            "body": [
                {
                    "slice_type": "quote",
                    "slice_label": null,
                    "primary": { "quote_text": [ { "type": "paragraph", "text": "Ship it", "spans": [] } ] },
                    "items": [ { "author_name": "Ada" }, { "author_name": "Grace" } ]
                }
            ],
            "not_in_schema": { "kept": true }
        }
    })
}

struct PathLinks;

impl LinkResolver for PathLinks {
    fn resolve(&self, _field: &FieldContext<'_>, link: &Value) -> anyhow::Result<Option<String>> {
        Ok(link
            .get("uid")
            .and_then(Value::as_str)
            .map(|uid| format!("/{uid}")))
    }
}

#[derive(Default)]
struct RecordingFetcher {
    requests: Mutex<Vec<FetchRequest>>,
}

#[async_trait]
impl RemoteFileFetcher for RecordingFetcher {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FileNode> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(FileNode {
            id: format!("file:{}", request.url),
            parent_node_id: request.parent_node_id,
            url: request.url,
            path: "/tmp/file".into(),
            size: 0,
        })
    }
}

struct FailingFetcher;

#[async_trait]
impl RemoteFileFetcher for FailingFetcher {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FileNode> {
        anyhow::bail!("network unreachable for {}", request.url)
    }
}

#[tokio::test]
async fn test_document_link_gets_node_id() {
    let paths = registry("page", json!({ "Main": { "link": { "type": "Link" } } }));
    let env = ProxyEnvironment::builder(node_id).build();
    let raw = json!({
        "id": "home",
        "type": "page",
        "data": { "link": { "link_type": "Document", "type": "page", "id": "abc" } }
    });

    let proxied = materialize(&raw, &paths, &env).await.unwrap();

    assert_eq!(proxied.node_id, "page home");
    assert_eq!(proxied.document["data"]["link"]["document"], json!("page abc"));
    assert_eq!(
        proxied.document["data"]["link"]["raw"],
        raw["data"]["link"]
    );
}

#[tokio::test]
async fn test_full_document() {
    let paths = page_registry();
    let fetcher = Arc::new(RecordingFetcher::default());
    let env = ProxyEnvironment::builder(node_id)
        .link_resolver(PathLinks)
        .image_normalization(NormalizeImages(true))
        .file_fetcher(fetcher.clone())
        .field_name_transform(|name| name.to_uppercase())
        .build();

    let proxied = materialize(&page_document(), &paths, &env).await.unwrap();
    let doc = &proxied.document;

    // Document metadata keeps its keys and values.
    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "uid", "type", "href", "tags", "data"]);
    assert_eq!(doc["uid"], json!("home"));
    assert_eq!(doc["tags"], json!(["landing"]));

    // Field records are renamed, in input order.
    let data = &doc["data"];
    let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec!["TITLE", "CTA_LINK", "HERO_IMAGE", "FEATURE_LIST", "BODY", "NOT_IN_SCHEMA"]
    );

    assert_eq!(data["TITLE"]["html"], json!("<h1>Welcome</h1>"));
    assert_eq!(data["TITLE"]["text"], json!("Welcome"));

    assert_eq!(data["CTA_LINK"]["url"], json!("/about"));
    assert_eq!(data["CTA_LINK"]["document"], json!("page abc"));

    let image = &data["HERO_IMAGE"];
    assert_eq!(
        image["localFile"],
        json!("file:https://images.example.com/hero shot.png")
    );
    assert_eq!(
        image["mobile"]["localFile"],
        json!("file:https://images.example.com/hero-mobile.png")
    );
    assert_eq!(image["alt"], json!("Hero"));

    let features = data["FEATURE_LIST"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["FEATURE_NAME"], json!("Fast"));
    assert_eq!(features[0]["FEATURE_LINK"]["url"], json!("https://fast.example.com"));
    assert_eq!(features[1]["FEATURE_LINK"], Value::Null);

    let slice = &data["BODY"][0];
    let keys: Vec<&String> = slice.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["slice_type", "slice_label", "primary", "items"]);
    assert_eq!(slice["primary"]["QUOTE_TEXT"]["text"], json!("Ship it"));
    assert_eq!(slice["items"][1]["AUTHOR_NAME"], json!("Grace"));

    assert_eq!(data["NOT_IN_SCHEMA"], json!({ "kept": true }));

    let requests = fetcher.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.parent_node_id == "page XyZ"));
}

#[tokio::test]
async fn test_failing_fetcher_only_nulls_local_files() {
    let paths = page_registry();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let env = ProxyEnvironment::builder(node_id)
        .link_resolver(PathLinks)
        .image_normalization(NormalizeImages(true))
        .file_fetcher(Arc::new(FailingFetcher))
        .diagnostics(tx)
        .build();

    let raw = page_document();
    let proxied = materialize(&raw, &paths, &env).await.unwrap();
    let data = &proxied.document["data"];

    assert_eq!(data["hero_image"]["localFile"], Value::Null);
    assert_eq!(data["hero_image"]["mobile"]["localFile"], Value::Null);
    assert_eq!(data["hero_image"]["url"], raw["data"]["hero_image"]["url"]);
    assert_eq!(data["title"]["text"], json!("Welcome"));
    assert_eq!(data["cta_link"]["url"], json!("/about"));
    assert_eq!(data["body"][0]["items"][0]["author_name"], json!("Ada"));

    drop(env);
    let mut diagnostics = Vec::new();
    while let Some(diagnostic) = rx.recv().await {
        diagnostics.push(diagnostic);
    }
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.kind == PathKind::Image));
    assert!(diagnostics[0].message.contains("network unreachable"));
}

struct BrokenLinks;

impl LinkResolver for BrokenLinks {
    fn resolve(&self, _field: &FieldContext<'_>, _link: &Value) -> anyhow::Result<Option<String>> {
        anyhow::bail!("link resolver misconfigured")
    }
}

#[tokio::test]
async fn test_failed_fields_keep_their_slot() {
    let paths = registry(
        "page",
        json!({ "Main": {
            "cta": { "type": "Link" },
            "summary": { "type": "StructuredText" },
            "label": { "type": "Text" }
        } }),
    );
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let env = ProxyEnvironment::builder(node_id)
        .link_resolver(BrokenLinks)
        .diagnostics(tx)
        .build();

    let raw = json!({
        "id": "1",
        "type": "page",
        "data": {
            "cta": { "link_type": "Document", "type": "page", "id": "2" },
            "summary": "not rich text",
            "label": "still here"
        }
    });
    let proxied = materialize(&raw, &paths, &env).await.unwrap();

    assert_eq!(
        proxied.document["data"],
        json!({ "cta": null, "summary": null, "label": "still here" })
    );

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    let mut paths: Vec<String> = vec![first.path.join("."), second.path.join(".")];
    paths.sort();
    assert_eq!(paths, vec!["page.data.cta", "page.data.summary"]);
}

#[tokio::test]
async fn test_images_are_not_fetched_unless_normalized() {
    let paths = page_registry();
    let fetcher = Arc::new(RecordingFetcher::default());
    let env = ProxyEnvironment::builder(node_id)
        .file_fetcher(fetcher.clone())
        .build();

    let proxied = materialize(&page_document(), &paths, &env).await.unwrap();

    assert_eq!(proxied.document["data"]["hero_image"]["localFile"], Value::Null);
    assert!(fetcher.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shape_is_preserved_for_mismatched_values() {
    let paths = page_registry();
    let env = ProxyEnvironment::builder(node_id).build();
    let raw = json!({
        "id": "odd",
        "type": "page",
        "data": {
            "feature_list": "not a list",
            "body": [ "slice-node-id", { "no_slice_type": true } ],
            "hero_image": null
        }
    });

    let proxied = materialize(&raw, &paths, &env).await.unwrap();
    assert_eq!(proxied.document, raw);
}

#[tokio::test]
async fn test_document_level_errors() {
    let paths = PathRegistry::new();
    let env = ProxyEnvironment::builder(node_id).build();

    let err = materialize(&json!(["not", "a", "document"]), &paths, &env)
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::InvalidDocument { found: "array" }));

    let err = materialize(&json!({ "id": "1" }), &paths, &env)
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::MissingDocumentType));
}

/// Holds back `a.png` until `b.png` has been requested.
#[derive(Default)]
struct GatedFetcher {
    gate: tokio::sync::Notify,
}

#[async_trait]
impl RemoteFileFetcher for GatedFetcher {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FileNode> {
        if request.url.ends_with("a.png") {
            self.gate.notified().await;
        } else {
            self.gate.notify_one();
        }
        Ok(FileNode {
            id: format!("file:{}", request.url),
            parent_node_id: request.parent_node_id,
            url: request.url,
            path: "/tmp/file".into(),
            size: 0,
        })
    }
}

#[tokio::test]
async fn test_slow_sibling_does_not_block_others() {
    let paths = registry(
        "page",
        json!({ "Main": { "first": { "type": "Image" }, "second": { "type": "Image" } } }),
    );
    let env = ProxyEnvironment::builder(node_id)
        .image_normalization(NormalizeImages(true))
        .file_fetcher(Arc::new(GatedFetcher::default()))
        .build();
    let raw = json!({
        "id": "1",
        "type": "page",
        "data": {
            "first": { "url": "https://images.example.com/a.png" },
            "second": { "url": "https://images.example.com/b.png" }
        }
    });

    let proxied = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        materialize(&raw, &paths, &env),
    )
    .await
    .expect("sibling images should be fetched concurrently")
    .unwrap();

    let data = &proxied.document["data"];
    assert_eq!(data["first"]["localFile"], json!("file:https://images.example.com/a.png"));
    assert_eq!(data["second"]["localFile"], json!("file:https://images.example.com/b.png"));
}

#[tokio::test]
async fn test_scalar_kinds_pass_through() {
    let paths = registry(
        "page",
        json!({ "Main": {
            "price": { "type": "Number" },
            "published": { "type": "Date" },
            "featured": { "type": "Boolean" },
            "location": { "type": "GeoPoint" },
            "video": { "type": "Embed" }
        } }),
    );
    let env = ProxyEnvironment::builder(node_id)
        .link_resolver(PathLinks)
        .build();
    let raw = json!({
        "id": "1",
        "type": "page",
        "data": {
            "price": 9.5,
            "published": "2024-01-31",
            "featured": true,
            "location": { "latitude": 48.85, "longitude": 2.35 },
            "video": { "link_type": "Document", "type": "page", "id": "2", "uid": "other" }
        }
    });

    let proxied = materialize(&raw, &paths, &env).await.unwrap();
    assert_eq!(proxied.document, raw);
}
