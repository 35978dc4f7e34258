//! The collaborators threaded through one materialization call.
//!
//! A [`ProxyEnvironment`] is built once per ingestion run and shared read-only
//! by every field of every document. Each collaborator sits behind a trait so
//! hosts can plug in their own link rules, markup, image policy and file store.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slicegraph_schema::{NodeIdBuilder, PathKind};
use tokio::sync::mpsc::UnboundedSender;

use crate::richtext::RichTextElement;

/// The field a collaborator is invoked for.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Raw field key
    pub key: &'a str,
    /// Raw field value
    pub value: &'a Value,
    /// The whole raw document
    pub node: &'a Value,
}

/// Resolves the URL of a document link.
pub trait LinkResolver: Send + Sync {
    /// `link` is the document link being rendered. It is the field value
    /// itself for Link fields and a span's data for rich text hyperlinks.
    fn resolve(&self, field: &FieldContext<'_>, link: &Value) -> anyhow::Result<Option<String>>;
}

/// Overrides rich text markup per element.
pub trait HtmlSerializer: Send + Sync {
    /// Return `Some(html)` to replace the default markup of `element`.
    fn serialize(
        &self,
        field: &FieldContext<'_>,
        element: &RichTextElement<'_>,
        children: &str,
    ) -> anyhow::Result<Option<String>>;
}

/// Decides whether an image should be downloaded.
#[async_trait]
pub trait ImageNormalization: Send + Sync {
    async fn should_normalize(&self, field: &FieldContext<'_>) -> bool;
}

/// A request to store a remote file locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Percent-decoded source URL
    pub url: String,
    /// Node id of the document that owns the file
    pub parent_node_id: String,
}

/// A locally stored remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub parent_node_id: String,
    pub url: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Downloads remote files and registers them as nodes.
#[async_trait]
pub trait RemoteFileFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FileNode>;
}

/// A field that degraded to `null` during materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiagnostic {
    pub path: Vec<String>,
    pub kind: PathKind,
    pub message: String,
}

/// Link resolver used when none is configured: document links get no URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLinkResolver;

impl LinkResolver for NoLinkResolver {
    fn resolve(&self, _field: &FieldContext<'_>, _link: &Value) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Serializer used when none is configured: default markup everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMarkup;

impl HtmlSerializer for DefaultMarkup {
    fn serialize(
        &self,
        _field: &FieldContext<'_>,
        _element: &RichTextElement<'_>,
        _children: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Fixed answer for every image.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeImages(pub bool);

#[async_trait]
impl ImageNormalization for NormalizeImages {
    async fn should_normalize(&self, _field: &FieldContext<'_>) -> bool {
        self.0
    }
}

type FieldNameTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Everything materialization needs besides the document and the registry.
#[derive(Clone)]
pub struct ProxyEnvironment {
    pub(crate) node_ids: Arc<dyn NodeIdBuilder>,
    pub(crate) field_name_transform: FieldNameTransform,
    pub(crate) link_resolver: Arc<dyn LinkResolver>,
    pub(crate) html_serializer: Arc<dyn HtmlSerializer>,
    pub(crate) image_normalization: Arc<dyn ImageNormalization>,
    pub(crate) file_fetcher: Option<Arc<dyn RemoteFileFetcher>>,
    pub(crate) diagnostics: Option<UnboundedSender<FieldDiagnostic>>,
}

impl ProxyEnvironment {
    /// Start building an environment around the host's node id scheme.
    pub fn builder(node_ids: impl NodeIdBuilder + 'static) -> ProxyEnvironmentBuilder {
        ProxyEnvironmentBuilder {
            env: ProxyEnvironment {
                node_ids: Arc::new(node_ids),
                field_name_transform: Arc::new(str::to_string),
                link_resolver: Arc::new(NoLinkResolver),
                html_serializer: Arc::new(DefaultMarkup),
                image_normalization: Arc::new(NormalizeImages(false)),
                file_fetcher: None,
                diagnostics: None,
            },
        }
    }

    pub fn node_id(&self, type_name: &str, id: &str) -> String {
        self.node_ids.node_id(type_name, id)
    }

    pub fn transform_field_name(&self, name: &str) -> String {
        (self.field_name_transform)(name)
    }
}

impl fmt::Debug for ProxyEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEnvironment")
            .field("file_fetcher", &self.file_fetcher.is_some())
            .field("diagnostics", &self.diagnostics.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProxyEnvironment`].
pub struct ProxyEnvironmentBuilder {
    env: ProxyEnvironment,
}

impl ProxyEnvironmentBuilder {
    pub fn field_name_transform(
        mut self,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.env.field_name_transform = Arc::new(transform);
        self
    }

    pub fn link_resolver(mut self, resolver: impl LinkResolver + 'static) -> Self {
        self.env.link_resolver = Arc::new(resolver);
        self
    }

    pub fn html_serializer(mut self, serializer: impl HtmlSerializer + 'static) -> Self {
        self.env.html_serializer = Arc::new(serializer);
        self
    }

    pub fn image_normalization(mut self, policy: impl ImageNormalization + 'static) -> Self {
        self.env.image_normalization = Arc::new(policy);
        self
    }

    pub fn file_fetcher(mut self, fetcher: Arc<dyn RemoteFileFetcher>) -> Self {
        self.env.file_fetcher = Some(fetcher);
        self
    }

    /// Report degraded fields on `sender` in addition to logging them.
    pub fn diagnostics(mut self, sender: UnboundedSender<FieldDiagnostic>) -> Self {
        self.env.diagnostics = Some(sender);
        self
    }

    pub fn build(self) -> ProxyEnvironment {
        self.env
    }
}
