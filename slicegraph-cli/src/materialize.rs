//! `slicegraph materialize`

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use slicegraph_config::SlicegraphConfig;
use slicegraph_proxy::{
    materialize, FieldContext, HttpFileFetcher, LinkResolver, NormalizeImages, ProxyEnvironment,
};
use slicegraph_schema::PathRegistry;
use tokio::sync::mpsc;
use tracing::info;

/// Resolves document links to `/<type>/<uid>`, falling back to the id when
/// the linked document has no UID.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLinks;

impl LinkResolver for PathLinks {
    fn resolve(&self, _field: &FieldContext<'_>, link: &Value) -> anyhow::Result<Option<String>> {
        let Some(document_type) = link.get("type").and_then(Value::as_str) else {
            return Ok(None);
        };
        let key = link
            .get("uid")
            .and_then(Value::as_str)
            .or_else(|| link.get("id").and_then(Value::as_str));
        Ok(key.map(|key| format!("/{document_type}/{key}")))
    }
}

/// Node ids of the command line: the document type and id joined by `-`.
pub fn node_id(type_name: &str, id: &str) -> String {
    format!("{type_name}-{id}")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Materialize the document at `document` against the registry at `paths`
/// and render the proxied document as JSON.
pub async fn run_materialize(
    document: &Path,
    paths: &Path,
    normalize_images: bool,
    config: &SlicegraphConfig,
) -> Result<String> {
    let raw: Value = read_json(document)?;
    let registry: PathRegistry = read_json(paths)?;

    let style = config.field_names;
    let fetcher = HttpFileFetcher::new(
        config.images.cache_dir.clone(),
        config.images.max_concurrent_downloads,
    );
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let env = ProxyEnvironment::builder(node_id)
        .field_name_transform(move |name: &str| style.apply(name))
        .link_resolver(PathLinks)
        .image_normalization(NormalizeImages(config.images.normalize || normalize_images))
        .file_fetcher(Arc::new(fetcher))
        .diagnostics(sender)
        .build();

    let proxied = materialize(&raw, &registry, &env).await?;
    drop(env);

    let mut degraded = Vec::new();
    while let Some(diagnostic) = receiver.recv().await {
        degraded.push(diagnostic.path.join("."));
    }
    info!(
        node_id = %proxied.node_id,
        degraded = degraded.len(),
        "materialized document"
    );
    if !degraded.is_empty() {
        eprintln!("Degraded fields: {}", degraded.join(", "));
    }

    Ok(serde_json::to_string_pretty(&proxied)?)
}
