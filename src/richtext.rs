//! Defines the Prismic structured-text model ([`RichTextNode`], [`Span`]) and
//! its two renderings: [`as_html`] for post bodies and [`as_text`] for titles
//! which arrive as structured text instead of a plain string.

use serde::Deserialize;

/// A structured-text field: an ordered list of block nodes.
pub type RichText = Vec<RichTextNode>;

/// One block of structured text (a paragraph, heading, list item, image,
/// etc).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RichTextNode {
    /// The block type. Nodes without a `type` are treated as paragraphs.
    #[serde(default, rename = "type")]
    pub kind: NodeKind,

    /// The raw text of the block.
    #[serde(default)]
    pub text: String,

    /// Inline formatting. Offsets are UTF-16 code-unit offsets into `text`.
    #[serde(default)]
    pub spans: Vec<Span>,

    /// The image source for `image` blocks.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub alt: Option<String>,

    #[serde(default)]
    pub copyright: Option<String>,

    /// The oEmbed payload for `embed` blocks.
    #[serde(default)]
    pub oembed: Option<Oembed>,
}

impl RichTextNode {
    /// Builds a plain paragraph node with no spans.
    pub fn paragraph<S: Into<String>>(text: S) -> RichTextNode {
        RichTextNode {
            kind: NodeKind::Paragraph,
            text: text.into(),
            ..RichTextNode::default()
        }
    }
}

/// The parts of an oEmbed response needed to render an `embed` block.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub embed_url: String,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub provider_name: String,

    /// Provider-supplied markup, emitted verbatim.
    #[serde(default)]
    pub html: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,

    /// Anything else; skipped when rendering.
    #[serde(other)]
    Unsupported,
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Paragraph
    }
}

impl NodeKind {
    fn tag(self) -> Option<&'static str> {
        match self {
            NodeKind::Paragraph => Some("p"),
            NodeKind::Heading1 => Some("h1"),
            NodeKind::Heading2 => Some("h2"),
            NodeKind::Heading3 => Some("h3"),
            NodeKind::Heading4 => Some("h4"),
            NodeKind::Heading5 => Some("h5"),
            NodeKind::Heading6 => Some("h6"),
            NodeKind::Preformatted => Some("pre"),
            NodeKind::ListItem | NodeKind::OrderedListItem => Some("li"),
            NodeKind::Image | NodeKind::Embed | NodeKind::Unsupported => None,
        }
    }

    fn list_tag(self) -> Option<&'static str> {
        match self {
            NodeKind::ListItem => Some("ul"),
            NodeKind::OrderedListItem => Some("ol"),
            _ => None,
        }
    }
}

/// An inline formatting range over a node's text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawSpan")]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String, target: Option<String> },
    Label(String),

    /// Span types we don't render; their text is still emitted.
    Unsupported,
}

#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: RawSpanData,
}

#[derive(Deserialize, Default)]
struct RawSpanData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

impl From<RawSpan> for Span {
    fn from(raw: RawSpan) -> Span {
        let kind = match (raw.kind.as_str(), raw.data) {
            ("strong", _) => SpanKind::Strong,
            ("em", _) => SpanKind::Em,
            (
                "hyperlink",
                RawSpanData {
                    url: Some(url),
                    target,
                    ..
                },
            ) => SpanKind::Hyperlink { url, target },
            ("label", RawSpanData { label: Some(label), .. }) => {
                SpanKind::Label(label)
            }
            _ => SpanKind::Unsupported,
        };
        Span {
            start: raw.start,
            end: raw.end,
            kind,
        }
    }
}

/// Renders structured text as HTML. Consecutive list items are grouped into a
/// single `<ul>` or `<ol>`; blocks are concatenated without separators.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list = node.kind.list_tag();
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match node.kind {
            NodeKind::Image => push_image(&mut out, node),
            NodeKind::Embed => push_embed(&mut out, node),
            kind => {
                if let Some(tag) = kind.tag() {
                    out.push_str(&format!("<{}>", tag));
                    push_text(&mut out, &node.text, &node.spans);
                    out.push_str(&format!("</{}>", tag));
                }
            }
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

/// Renders structured text as plain text, joining blocks with a space.
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|node| node.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}

fn push_image(out: &mut String, node: &RichTextNode) {
    use html_escape::encode_double_quoted_attribute as attr;
    let url = match &node.url {
        Some(url) => url,
        None => return,
    };
    out.push_str(&format!(
        r#"<p class="block-img"><img src="{}" alt="{}" copyright="{}"></p>"#,
        attr(url),
        attr(node.alt.as_deref().unwrap_or("")),
        attr(node.copyright.as_deref().unwrap_or("")),
    ));
}

fn push_embed(out: &mut String, node: &RichTextNode) {
    use html_escape::encode_double_quoted_attribute as attr;
    let oembed = match &node.oembed {
        Some(oembed) => oembed,
        None => return,
    };
    out.push_str(&format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        attr(&oembed.embed_url),
        attr(&oembed.kind),
        attr(&oembed.provider_name),
        oembed.html,
    ));
}

fn push_text(out: &mut String, text: &str, spans: &[Span]) {
    let chars: Vec<char> = text.chars().collect();

    // `starts[i]` is the UTF-16 offset at which `chars[i]` begins; the last
    // entry is the UTF-16 length of the whole text.
    let mut starts = Vec::with_capacity(chars.len() + 1);
    let mut offset = 0;
    for c in &chars {
        starts.push(offset);
        offset += c.len_utf16();
    }
    starts.push(offset);
    let char_index = |utf16: usize| {
        let i = match starts.binary_search(&utf16) {
            Ok(i) | Err(i) => i,
        };
        i.min(chars.len())
    };

    let spans: Vec<Span> = spans
        .iter()
        .map(|span| Span {
            start: char_index(span.start),
            end: char_index(span.end),
            kind: span.kind.clone(),
        })
        .collect();
    let mut sorted: Vec<&Span> = spans.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    push_spans(out, &chars, 0, chars.len(), &sorted);
}

// Renders `chars[start..end]` given the spans that fall inside that range,
// sorted by start ascending and then by end descending. A span's children are
// the spans that follow it and end no later than it does. Spans which only
// partially overlap a preceding sibling are clipped to begin where it ends.
fn push_spans(
    out: &mut String,
    chars: &[char],
    start: usize,
    end: usize,
    spans: &[&Span],
) {
    let mut cursor = start;
    let mut i = 0;
    while i < spans.len() {
        let span = spans[i];
        let span_start = span.start.max(cursor).min(end);
        let span_end = span.end.min(end);

        let mut j = i + 1;
        while j < spans.len() && spans[j].end <= span.end {
            j += 1;
        }

        if span_start < span_end {
            push_escaped(out, &chars[cursor..span_start]);
            open_span(out, &span.kind);
            push_spans(out, chars, span_start, span_end, &spans[i + 1..j]);
            close_span(out, &span.kind);
            cursor = span_end;
        }
        i = j;
    }
    push_escaped(out, &chars[cursor..end]);
}

fn open_span(out: &mut String, kind: &SpanKind) {
    use html_escape::encode_double_quoted_attribute as attr;
    match kind {
        SpanKind::Strong => out.push_str("<strong>"),
        SpanKind::Em => out.push_str("<em>"),
        SpanKind::Hyperlink { url, target } => match target {
            Some(target) => out.push_str(&format!(
                r#"<a href="{}" target="{}" rel="noopener">"#,
                attr(url),
                attr(target),
            )),
            None => out.push_str(&format!(r#"<a href="{}">"#, attr(url))),
        },
        SpanKind::Label(label) => {
            out.push_str(&format!(r#"<span class="{}">"#, attr(label)))
        }
        SpanKind::Unsupported => {}
    }
}

fn close_span(out: &mut String, kind: &SpanKind) {
    match kind {
        SpanKind::Strong => out.push_str("</strong>"),
        SpanKind::Em => out.push_str("</em>"),
        SpanKind::Hyperlink { .. } => out.push_str("</a>"),
        SpanKind::Label(_) => out.push_str("</span>"),
        SpanKind::Unsupported => {}
    }
}

fn push_escaped(out: &mut String, chars: &[char]) {
    let raw: String = chars.iter().collect();
    out.push_str(&html_escape::encode_text(&raw).replace('\n', "<br />"));
}

#[cfg(test)]
mod test {
    use super::*;

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span { start, end, kind }
    }

    #[test]
    fn test_as_html_paragraphs() {
        let nodes = vec![
            RichTextNode::paragraph("one two"),
            RichTextNode::paragraph("three"),
        ];
        assert_eq!("<p>one two</p><p>three</p>", as_html(&nodes));
    }

    #[test]
    fn test_as_html_escapes_text() {
        let nodes = vec![RichTextNode::paragraph("a < b & c")];
        assert_eq!("<p>a &lt; b &amp; c</p>", as_html(&nodes));
    }

    #[test]
    fn test_as_html_line_breaks() {
        let nodes = vec![RichTextNode::paragraph("first\nsecond")];
        assert_eq!("<p>first<br />second</p>", as_html(&nodes));
    }

    #[test]
    fn test_as_html_groups_list_items() {
        let item = |kind, text: &str| RichTextNode {
            kind,
            text: text.to_owned(),
            ..RichTextNode::default()
        };
        let nodes = vec![
            item(NodeKind::ListItem, "a"),
            item(NodeKind::ListItem, "b"),
            item(NodeKind::OrderedListItem, "c"),
            item(NodeKind::Paragraph, "d"),
        ];
        assert_eq!(
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>",
            as_html(&nodes)
        );
    }

    #[test]
    fn test_as_html_nested_spans() {
        let nodes = vec![RichTextNode {
            kind: NodeKind::Heading2,
            text: "hello brave world".to_owned(),
            spans: vec![
                span(6, 11, SpanKind::Em),
                span(0, 11, SpanKind::Strong),
            ],
            ..RichTextNode::default()
        }];
        assert_eq!(
            "<h2><strong>hello <em>brave</em></strong> world</h2>",
            as_html(&nodes)
        );
    }

    #[test]
    fn test_as_html_hyperlink_and_overlap() {
        let nodes = vec![RichTextNode {
            kind: NodeKind::Paragraph,
            text: "go there now".to_owned(),
            spans: vec![
                span(
                    3,
                    8,
                    SpanKind::Hyperlink {
                        url: "https://example.org/?a=1&b=2".to_owned(),
                        target: None,
                    },
                ),
                span(5, 12, SpanKind::Strong),
            ],
            ..RichTextNode::default()
        }];
        assert_eq!(
            "<p>go <a href=\"https://example.org/?a=1&amp;b=2\">there</a><strong> now</strong></p>",
            as_html(&nodes)
        );
    }

    #[test]
    fn test_as_html_skips_unsupported_blocks() {
        let nodes = vec![
            RichTextNode {
                kind: NodeKind::Unsupported,
                ..RichTextNode::default()
            },
            RichTextNode::paragraph("kept"),
        ];
        assert_eq!("<p>kept</p>", as_html(&nodes));
    }

    #[test]
    fn test_as_html_span_offsets_are_utf16() {
        // The rocket is two UTF-16 code units, so "go" spans 3..5.
        let nodes = vec![RichTextNode {
            kind: NodeKind::Paragraph,
            text: "\u{1f680} go fast".to_owned(),
            spans: vec![span(3, 5, SpanKind::Strong)],
            ..RichTextNode::default()
        }];
        assert_eq!(
            "<p>\u{1f680} <strong>go</strong> fast</p>",
            as_html(&nodes)
        );
    }

    #[test]
    fn test_as_html_image() -> serde_json::Result<()> {
        let nodes: RichText = serde_json::from_str(
            r#"[
                {"type": "image", "url": "https://images.prismic.io/rocket.png",
                 "alt": "a \"rocket\"", "copyright": null,
                 "dimensions": {"width": 800, "height": 600}},
                {"type": "paragraph", "text": "a", "spans": []}
            ]"#,
        )?;
        assert_eq!(
            concat!(
                r#"<p class="block-img"><img src="https://images.prismic.io/rocket.png" "#,
                r#"alt="a &quot;rocket&quot;" copyright=""></p><p>a</p>"#,
            ),
            as_html(&nodes)
        );
        Ok(())
    }

    #[test]
    fn test_as_html_embed() -> serde_json::Result<()> {
        let nodes: RichText = serde_json::from_str(
            r#"[{
                "type": "embed",
                "oembed": {
                    "embed_url": "https://youtu.be/abc",
                    "type": "video",
                    "provider_name": "YouTube",
                    "html": "<iframe src=\"https://www.youtube.com/embed/abc\"></iframe>"
                }
            }]"#,
        )?;
        assert_eq!(
            concat!(
                r#"<div data-oembed="https://youtu.be/abc" data-oembed-type="video" "#,
                r#"data-oembed-provider="YouTube">"#,
                r#"<iframe src="https://www.youtube.com/embed/abc"></iframe></div>"#,
            ),
            as_html(&nodes)
        );
        Ok(())
    }

    #[test]
    fn test_as_text() {
        let nodes = vec![
            RichTextNode::paragraph("Como utilizar"),
            RichTextNode::paragraph("Hooks"),
        ];
        assert_eq!("Como utilizar Hooks", as_text(&nodes));
    }

    #[test]
    fn test_deserialize_node() -> serde_json::Result<()> {
        let node: RichTextNode = serde_json::from_str(
            r#"{
                "type": "paragraph",
                "text": "see docs",
                "spans": [
                    {"start": 4, "end": 8, "type": "hyperlink",
                     "data": {"link_type": "Web", "url": "https://docs.rs"}},
                    {"start": 0, "end": 3, "type": "strong"}
                ]
            }"#,
        )?;
        assert_eq!(NodeKind::Paragraph, node.kind);
        assert_eq!(
            SpanKind::Hyperlink {
                url: "https://docs.rs".to_owned(),
                target: None
            },
            node.spans[0].kind
        );
        assert_eq!(SpanKind::Strong, node.spans[1].kind);
        Ok(())
    }

    #[test]
    fn test_deserialize_untyped_node() -> serde_json::Result<()> {
        let node: RichTextNode = serde_json::from_str(r#"{"text": "plain"}"#)?;
        assert_eq!(RichTextNode::paragraph("plain"), node);
        Ok(())
    }
}
