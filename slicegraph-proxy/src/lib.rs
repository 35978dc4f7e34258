//! Document materialization
//!
//! `slicegraph-proxy` turns a raw CMS document into the proxied form stored
//! downstream: rich text rendered to HTML and text, links resolved to URLs and
//! node ids, images backed by local files. Field kinds come from the path
//! registry compiled by `slicegraph-schema`.
//!
//! Failures are isolated per field. Only a document that is not an object, or
//! that has no `type`, is rejected.

pub mod engine;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod link;
pub mod richtext;

pub use engine::{materialize, ProxiedDocument};
pub use environment::{
    DefaultMarkup, FetchRequest, FieldContext, FieldDiagnostic, FileNode, HtmlSerializer,
    ImageNormalization, LinkResolver, NoLinkResolver, NormalizeImages, ProxyEnvironment,
    ProxyEnvironmentBuilder, RemoteFileFetcher,
};
pub use error::{FieldError, ProxyError, Result};
pub use fetch::{file_id, HttpFileFetcher};
pub use richtext::{as_html, as_text, RichTextElement};
