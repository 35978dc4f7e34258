//! Rich text rendering.
//!
//! Blocks are rendered in order; consecutive list items are wrapped in their
//! list element. Span offsets count UTF-16 code units, as the CMS emits them.
//! Every element goes through the configured [`HtmlSerializer`] first and
//! falls back to the default markup when it declines.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;

use crate::environment::{FieldContext, HtmlSerializer, LinkResolver};
use crate::error::FieldError;
use crate::link;

static NO_NODE: Value = Value::Null;

/// An element handed to an [`HtmlSerializer`].
#[derive(Debug, Clone, Copy)]
pub struct RichTextElement<'a> {
    /// Block type (`paragraph`, `heading2`, `list-item`, ...), span type
    /// (`strong`, `hyperlink`, ...) or list group (`group-list-item`,
    /// `group-o-list-item`)
    pub element_type: &'a str,
    /// The raw block or span. `null` for list groups
    pub node: &'a Value,
    /// Text covered by the element
    pub text: &'a str,
}

/// Plain text of a rich text value: block texts joined with a space.
pub fn as_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML of a rich text value.
pub fn as_html(
    blocks: &[Value],
    field: &FieldContext<'_>,
    link_resolver: &dyn LinkResolver,
    serializer: &dyn HtmlSerializer,
) -> Result<String, FieldError> {
    let renderer = Renderer {
        field,
        link_resolver,
        serializer,
    };

    let mut html = Vec::new();
    let mut index = 0;
    while index < blocks.len() {
        let kind = block_type(&blocks[index]);
        let group = match kind {
            "list-item" => Some(("group-list-item", "ul")),
            "o-list-item" => Some(("group-o-list-item", "ol")),
            _ => None,
        };

        match group {
            Some((group_type, tag)) => {
                let start = index;
                while index < blocks.len() && block_type(&blocks[index]) == kind {
                    index += 1;
                }
                let items = blocks[start..index]
                    .iter()
                    .map(|block| renderer.block(block))
                    .collect::<Result<Vec<_>, _>>()?
                    .concat();
                let element = RichTextElement {
                    element_type: group_type,
                    node: &NO_NODE,
                    text: "",
                };
                html.push(renderer.element(&element, &items, || format!("<{tag}>{items}</{tag}>"))?);
            }
            None => {
                html.push(renderer.block(&blocks[index])?);
                index += 1;
            }
        }
    }

    Ok(html.concat())
}

fn block_type(block: &Value) -> &str {
    block.get("type").and_then(Value::as_str).unwrap_or_default()
}

fn attribute(value: &str) -> String {
    encode_double_quoted_attribute(value).into_owned()
}

fn str_field<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// A span with offsets resolved against the block text.
#[derive(Debug, Clone)]
struct Span<'a> {
    start: usize,
    end: usize,
    span_type: &'a str,
    node: &'a Value,
}

/// Text run or span in the rendered tree.
#[derive(Debug)]
enum Node<'a> {
    Text { start: usize, end: usize },
    Span { span: Span<'a>, children: Vec<Node<'a>> },
}

/// Nest `spans` (sorted by start, longest first) within `[start, end)`. A
/// span that overruns the span it starts in is clipped to it.
fn build_tree<'a>(start: usize, end: usize, spans: &[Span<'a>]) -> Vec<Node<'a>> {
    let mut nodes = Vec::new();
    let mut cursor = start;
    let mut index = 0;

    while index < spans.len() {
        let span = &spans[index];
        if span.start > cursor {
            nodes.push(Node::Text {
                start: cursor,
                end: span.start,
            });
        }

        let mut next = index + 1;
        while next < spans.len() && spans[next].start < span.end {
            next += 1;
        }
        let nested: Vec<Span<'a>> = spans[index + 1..next]
            .iter()
            .map(|child| Span {
                end: child.end.min(span.end),
                ..child.clone()
            })
            .collect();

        nodes.push(Node::Span {
            span: span.clone(),
            children: build_tree(span.start, span.end, &nested),
        });
        cursor = cursor.max(span.end);
        index = next;
    }

    if cursor < end {
        nodes.push(Node::Text { start: cursor, end });
    }
    nodes
}

struct Renderer<'r> {
    field: &'r FieldContext<'r>,
    link_resolver: &'r dyn LinkResolver,
    serializer: &'r dyn HtmlSerializer,
}

impl Renderer<'_> {
    /// Serializer markup, or `default` when the serializer declines.
    fn element(
        &self,
        element: &RichTextElement<'_>,
        children: &str,
        default: impl FnOnce() -> String,
    ) -> Result<String, FieldError> {
        match self
            .serializer
            .serialize(self.field, element, children)
            .map_err(FieldError::HtmlSerializer)?
        {
            Some(html) => Ok(html),
            None => Ok(default()),
        }
    }

    fn link_url(&self, link: &Value) -> Result<String, FieldError> {
        Ok(link::url(link, self.field, self.link_resolver)?.unwrap_or_default())
    }

    fn block(&self, block: &Value) -> Result<String, FieldError> {
        let block_type = block_type(block);
        let text = str_field(block, "text");
        let element = RichTextElement {
            element_type: block_type,
            node: block,
            text,
        };

        let class = block
            .get("label")
            .and_then(Value::as_str)
            .map(|label| format!(" class=\"{}\"", attribute(label)))
            .unwrap_or_default();

        match block_type {
            "image" => {
                let image = format!(
                    "<img src=\"{}\" alt=\"{}\" copyright=\"{}\" />",
                    attribute(str_field(block, "url")),
                    attribute(str_field(block, "alt")),
                    attribute(str_field(block, "copyright")),
                );
                let image = match block.get("linkTo").filter(|link| link.is_object()) {
                    Some(link) => format!("<a href=\"{}\">{image}</a>", attribute(&self.link_url(link)?)),
                    None => image,
                };
                self.element(&element, "", || {
                    format!("<p class=\"block-img{}\">{image}</p>", class_suffix(block))
                })
            }
            "embed" => {
                let oembed = block.get("oembed").unwrap_or(&NO_NODE);
                self.element(&element, "", || {
                    format!(
                        "<div data-oembed=\"{}\" data-oembed-type=\"{}\" data-oembed-provider=\"{}\"{class}>{}</div>",
                        attribute(str_field(oembed, "embed_url")),
                        attribute(str_field(oembed, "type")),
                        attribute(str_field(oembed, "provider_name")),
                        str_field(oembed, "html"),
                    )
                })
            }
            _ => {
                let children = self.spans(block, text)?;
                let tag = match block_type {
                    "heading1" => "h1",
                    "heading2" => "h2",
                    "heading3" => "h3",
                    "heading4" => "h4",
                    "heading5" => "h5",
                    "heading6" => "h6",
                    "preformatted" => "pre",
                    "list-item" | "o-list-item" => "li",
                    _ => "p",
                };
                self.element(&element, &children, || format!("<{tag}{class}>{children}</{tag}>"))
            }
        }
    }

    fn spans(&self, block: &Value, text: &str) -> Result<String, FieldError> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let len = units.len();

        let mut spans: Vec<Span<'_>> = block
            .get("spans")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|span| {
                let start = span.get("start")?.as_u64()? as usize;
                let end = span.get("end")?.as_u64()? as usize;
                Some(Span {
                    start: start.min(len),
                    end: end.min(len).max(start.min(len)),
                    span_type: span.get("type").and_then(Value::as_str).unwrap_or_default(),
                    node: span,
                })
            })
            .collect();
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let tree = build_tree(0, len, &spans);
        self.nodes(&tree, &units)
    }

    fn nodes(&self, nodes: &[Node<'_>], units: &[u16]) -> Result<String, FieldError> {
        let mut html = String::new();
        for node in nodes {
            match node {
                Node::Text { start, end } => {
                    let text = String::from_utf16_lossy(&units[*start..*end]);
                    html.push_str(&encode_text(&text).replace('\n', "<br />"));
                }
                Node::Span { span, children } => {
                    let children = self.nodes(children, units)?;
                    let text = String::from_utf16_lossy(&units[span.start..span.end]);
                    html.push_str(&self.span(span, &text, &children)?);
                }
            }
        }
        Ok(html)
    }

    fn span(&self, span: &Span<'_>, text: &str, children: &str) -> Result<String, FieldError> {
        let element = RichTextElement {
            element_type: span.span_type,
            node: span.node,
            text,
        };
        let data = span.node.get("data").unwrap_or(&NO_NODE);

        match span.span_type {
            "strong" => self.element(&element, children, || format!("<strong>{children}</strong>")),
            "em" => self.element(&element, children, || format!("<em>{children}</em>")),
            "label" => {
                let label = attribute(str_field(data, "label"));
                self.element(&element, children, || {
                    format!("<span class=\"{label}\">{children}</span>")
                })
            }
            "hyperlink" => {
                let href = attribute(&self.link_url(data)?);
                let target = match data.get("target").and_then(Value::as_str) {
                    Some(target) => format!(" target=\"{}\" rel=\"noopener\"", attribute(target)),
                    None => String::new(),
                };
                self.element(&element, children, || {
                    format!("<a href=\"{href}\"{target}>{children}</a>")
                })
            }
            _ => self.element(&element, children, || children.to_string()),
        }
    }
}

fn class_suffix(block: &Value) -> String {
    block
        .get("label")
        .and_then(Value::as_str)
        .map(|label| format!(" {}", attribute(label)))
        .unwrap_or_default()
}
