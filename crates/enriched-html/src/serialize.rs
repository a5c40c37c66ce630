//! Document to HTML.

use std::fmt::Write as _;

use enriched_core::range::ZWS;
use enriched_core::{Annotation, Document, Style, StyleCategory, StyleKind};
use html_escape::encode_double_quoted_attribute;
use tracing::debug;

/// Block container a paragraph sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    BlockQuote,
    CodeBlock,
}

impl Block {
    fn tag(self) -> Option<&'static str> {
        match self {
            Block::None => None,
            Block::BlockQuote => Some("blockquote"),
            Block::CodeBlock => Some("codeblock"),
        }
    }
}

/// List a paragraph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Unordered,
    Ordered,
    Checkbox,
}

impl List {
    fn open(self) -> &'static str {
        match self {
            List::Unordered => "<ul>\n",
            List::Ordered => "<ol>\n",
            List::Checkbox => "<ul data-type=\"checkbox\">\n",
        }
    }

    fn close(self) -> &'static str {
        match self {
            List::Ordered => "</ol>\n",
            List::Unordered | List::Checkbox => "</ul>\n",
        }
    }
}

/// Inline tags, in nesting order.
const INLINE_ORDER: [StyleKind; 9] = [
    StyleKind::Bold,
    StyleKind::Italic,
    StyleKind::Underline,
    StyleKind::InlineCode,
    StyleKind::Strikethrough,
    StyleKind::Link,
    StyleKind::Mention,
    StyleKind::Color,
    StyleKind::Image,
];

fn inline_rank(kind: StyleKind) -> usize {
    INLINE_ORDER
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(INLINE_ORDER.len())
}

fn block_of(doc: &Document, start: usize, end: usize) -> Block {
    if start == end {
        Block::None
    } else if !doc.query(StyleKind::CodeBlock, start, end).is_empty() {
        Block::CodeBlock
    } else if !doc.query(StyleKind::BlockQuote, start, end).is_empty() {
        Block::BlockQuote
    } else {
        Block::None
    }
}

/// Serialize `doc` to HTML.
///
/// Zero-width markers are dropped and the image placeholder char is replaced by its `<img>`
/// tag. Paragraphs are emitted one per line inside an `<html>` root.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::from("<html>\n");
    let paragraphs = doc.paragraphs(0, doc.len());

    let mut i = 0;
    while i < paragraphs.len() {
        let block = block_of(doc, paragraphs[i].0, paragraphs[i].1);
        let run_end = paragraphs[i..]
            .iter()
            .position(|(s, e)| block_of(doc, *s, *e) != block)
            .map_or(paragraphs.len(), |offset| i + offset);

        if let Some(tag) = block.tag() {
            let _ = writeln!(out, "<{tag}>");
        }
        write_paragraphs(&mut out, doc, &paragraphs[i..run_end]);
        if let Some(tag) = block.tag() {
            let _ = writeln!(out, "</{tag}>");
        }
        i = run_end;
    }

    out.push_str("</html>");
    out
}

fn write_paragraphs(out: &mut String, doc: &Document, paragraphs: &[(usize, usize)]) {
    let mut open_list: Option<List> = None;

    for &(start, end) in paragraphs {
        if start == end {
            if let Some(list) = open_list.take() {
                out.push_str(list.close());
            }
            out.push_str("<br>\n");
            continue;
        }

        let list_item = StyleKind::LIST
            .into_iter()
            .find_map(|kind| doc.query(kind, start, end).into_iter().next());
        let list = list_item.as_ref().map(|item| match item.style() {
            Style::OrderedList { .. } => List::Ordered,
            Style::CheckboxList { .. } => List::Checkbox,
            _ => List::Unordered,
        });

        if open_list != list {
            if let Some(previous) = open_list {
                out.push_str(previous.close());
            }
            if let Some(next) = list {
                out.push_str(next.open());
            }
            open_list = list;
        }

        let tag = match &list_item {
            Some(_) => "li",
            None => heading_tag(doc, start, end).unwrap_or("p"),
        };
        out.push('<');
        out.push_str(tag);
        if let Some(Style::CheckboxList { checked: true }) = list_item.as_ref().map(Annotation::style)
        {
            out.push_str(" checked");
        }
        out.push('>');
        write_inline(out, doc, start, end);
        let _ = writeln!(out, "</{tag}>");
    }

    if let Some(list) = open_list {
        out.push_str(list.close());
    }
}

fn heading_tag(doc: &Document, start: usize, end: usize) -> Option<&'static str> {
    const TAGS: [(StyleKind, &str); 6] = [
        (StyleKind::H1, "h1"),
        (StyleKind::H2, "h2"),
        (StyleKind::H3, "h3"),
        (StyleKind::H4, "h4"),
        (StyleKind::H5, "h5"),
        (StyleKind::H6, "h6"),
    ];
    TAGS.into_iter()
        .find(|(kind, _)| !doc.query(*kind, start, end).is_empty())
        .map(|(_, tag)| tag)
}

fn is_inline(annotation: &Annotation) -> bool {
    matches!(
        annotation.kind().category(),
        StyleCategory::Inline | StyleCategory::Parametrized
    )
}

fn write_inline(out: &mut String, doc: &Document, start: usize, end: usize) {
    let spans: Vec<&Annotation> = doc
        .annotations()
        .overlapping(start, end)
        .into_iter()
        .filter(|a| is_inline(a))
        .collect();

    let mut boundaries: Vec<usize> = spans
        .iter()
        .flat_map(|a| [a.start(), a.end()])
        .filter(|offset| *offset > start && *offset < end)
        .chain([start, end])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut collapsible = true;
    for window in boundaries.windows(2) {
        let (from, to) = (window[0], window[1]);
        let mut active: Vec<&Annotation> = spans
            .iter()
            .copied()
            .filter(|a| a.start() <= from && a.end() >= to)
            .collect();
        active.sort_by_key(|a| inline_rank(a.kind()));

        let text = doc.slice(from, to);
        let has_image = active.iter().any(|a| a.kind() == StyleKind::Image);
        if !has_image && text.chars().all(|c| c == ZWS) {
            continue;
        }

        for annotation in &active {
            open_tag(out, annotation.style());
        }
        if has_image {
            collapsible = false;
        } else {
            push_escaped(out, &text, &mut collapsible);
        }
        for annotation in active.iter().rev() {
            close_tag(out, annotation.style());
        }
    }
}

fn open_tag(out: &mut String, style: &Style) {
    match style {
        Style::Bold => out.push_str("<b>"),
        Style::Italic => out.push_str("<i>"),
        Style::Underline => out.push_str("<u>"),
        Style::InlineCode => out.push_str("<code>"),
        Style::Strikethrough => out.push_str("<s>"),
        Style::Link { url } => {
            let _ = write!(out, "<a href=\"{}\">", encode_double_quoted_attribute(url));
        }
        Style::Mention {
            indicator,
            text,
            attributes,
        } => {
            let _ = write!(
                out,
                "<mention text=\"{}\" indicator=\"{}\"",
                encode_double_quoted_attribute(text),
                encode_double_quoted_attribute(indicator)
            );
            for (key, value) in attributes {
                if !is_attribute_name(key) {
                    debug!(key = %key, "skipping mention attribute with an unwritable name");
                    continue;
                }
                let _ = write!(out, " {key}=\"{}\"", encode_double_quoted_attribute(value));
            }
            out.push('>');
        }
        Style::Color(color) => {
            let _ = write!(out, "<font color=\"{color}\">");
        }
        Style::Image { src, width, height } => {
            let _ = write!(
                out,
                "<img src=\"{}\" width=\"{width}\" height=\"{height}\"/>",
                encode_double_quoted_attribute(src)
            );
        }
        _ => {}
    }
}

/// Whether `key` can be written as an extra mention attribute: a plain name that does not
/// shadow `text` or `indicator`.
fn is_attribute_name(key: &str) -> bool {
    let mut chars = key.chars();
    let valid_first = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    valid_first
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        && !matches!(key, "text" | "indicator")
}

fn close_tag(out: &mut String, style: &Style) {
    let tag = match style {
        Style::Bold => "b",
        Style::Italic => "i",
        Style::Underline => "u",
        Style::InlineCode => "code",
        Style::Strikethrough => "s",
        Style::Link { .. } => "a",
        Style::Mention { .. } => "mention",
        Style::Color(_) => "font",
        _ => return,
    };
    let _ = write!(out, "</{tag}>");
}

/// Escape paragraph text: markers are dropped, `<`, `>` and `&` become entities, chars outside
/// printable ASCII become numeric references and spaces keep their width with `&nbsp;`.
///
/// `collapsible` is true while a plain space would be dropped by a reader: at the start of a
/// paragraph and right after a plain space. It carries across inline tag boundaries.
fn push_escaped(out: &mut String, text: &str, collapsible: &mut bool) {
    let mut chars = text.chars().filter(|c| *c != ZWS).peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            if *collapsible || chars.peek() == Some(&' ') {
                out.push_str("&nbsp;");
                *collapsible = false;
            } else {
                out.push(' ');
                *collapsible = true;
            }
            continue;
        }

        *collapsible = false;
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c if c < ' ' || c > '\u{7e}' => {
                let _ = write!(out, "&#{};", c as u32);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use enriched_core::Rgba;
    use pretty_assertions::assert_eq;

    use super::*;

    fn escaped(text: &str) -> String {
        let mut out = String::new();
        push_escaped(&mut out, text, &mut true);
        out
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escaped("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escaped("a   b"), "a&nbsp;&nbsp; b");
        assert_eq!(escaped("\u{200B}zoë 😀"), "zo&#235; &#128512;");
    }

    #[test]
    fn test_leading_spaces_are_kept() {
        assert_eq!(escaped(" indented"), "&nbsp;indented");
        assert_eq!(escaped("\u{200B}  two"), "&nbsp; two");

        let doc = Document::from_text(" a\n b");
        assert_eq!(
            to_html(&doc),
            "<html>\n<p>&nbsp;a</p>\n<p>&nbsp;b</p>\n</html>"
        );
    }

    #[test]
    fn test_space_run_split_by_inline_tags() {
        let doc = Document::from_parts("a  b", [(Style::Bold, 0, 2)]);
        assert_eq!(to_html(&doc), "<html>\n<p><b>a </b>&nbsp;b</p>\n</html>");

        let doc = Document::from_parts("a  b", [(Style::Bold, 2, 4)]);
        assert_eq!(to_html(&doc), "<html>\n<p>a <b>&nbsp;b</b></p>\n</html>");
    }

    #[test]
    fn test_plain_paragraphs() {
        let doc = Document::from_text("one\n\ntwo");
        assert_eq!(to_html(&doc), "<html>\n<p>one</p>\n<br>\n<p>two</p>\n</html>");
        assert_eq!(to_html(&Document::new()), "<html>\n<br>\n</html>");
    }

    #[test]
    fn test_link() {
        let doc = Document::from_parts(
            "click",
            [(
                Style::Link {
                    url: "https://x".to_string(),
                },
                0,
                5,
            )],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<p><a href=\"https://x\">click</a></p>\n</html>"
        );
    }

    #[test]
    fn test_overlapping_inline_styles_are_nested_canonically() {
        let doc = Document::from_parts(
            "abc",
            [(Style::Italic, 0, 3), (Style::Bold, 1, 2), (Style::Color(Rgba(0xff0000ff)), 1, 2)],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<p><i>a</i><b><i><font color=\"#ff0000ff\">b</font></i></b><i>c</i></p>\n</html>"
        );
    }

    #[test]
    fn test_lists_and_headings() {
        let doc = Document::from_parts(
            "\u{200B}title\n\u{200B}a\n\u{200B}b\n\u{200B}done",
            [
                (Style::H2, 0, 6),
                (Style::OrderedList { index: 1 }, 7, 9),
                (Style::OrderedList { index: 2 }, 10, 12),
                (Style::CheckboxList { checked: true }, 13, 18),
            ],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<h2>title</h2>\n<ol>\n<li>a</li>\n<li>b</li>\n</ol>\n\
             <ul data-type=\"checkbox\">\n<li checked>done</li>\n</ul>\n</html>"
        );
    }

    #[test]
    fn test_block_quote_run() {
        let doc = Document::from_parts(
            "\u{200B}q1\n\u{200B}q2\nafter",
            [(Style::BlockQuote, 0, 7)],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<blockquote>\n<p>q1</p>\n<p>q2</p>\n</blockquote>\n<p>after</p>\n</html>"
        );
    }

    #[test]
    fn test_mention_attribute_names_are_checked() {
        let attributes = BTreeMap::from([
            ("data-id".to_string(), "7".to_string()),
            ("x\" onclick=\"y".to_string(), "1".to_string()),
            ("a b".to_string(), "2".to_string()),
            ("text".to_string(), "other".to_string()),
            ("1st".to_string(), "3".to_string()),
        ]);
        let doc = Document::from_parts(
            "@Ann",
            [(
                Style::Mention {
                    indicator: "@".to_string(),
                    text: "@Ann".to_string(),
                    attributes,
                },
                0,
                4,
            )],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<p><mention text=\"@Ann\" indicator=\"@\" data-id=\"7\">@Ann</mention></p>\n</html>"
        );
    }

    #[test]
    fn test_image_and_mention() {
        let attributes = BTreeMap::from([("id".to_string(), "7".to_string())]);
        let doc = Document::from_parts(
            "\u{FFFC} @Ann",
            [
                (
                    Style::Image {
                        src: "a.png".to_string(),
                        width: 10,
                        height: 20,
                    },
                    0,
                    1,
                ),
                (
                    Style::Mention {
                        indicator: "@".to_string(),
                        text: "@Ann".to_string(),
                        attributes,
                    },
                    2,
                    6,
                ),
            ],
        );
        assert_eq!(
            to_html(&doc),
            "<html>\n<p><img src=\"a.png\" width=\"10\" height=\"20\"/> \
             <mention text=\"@Ann\" indicator=\"@\" id=\"7\">@Ann</mention></p>\n</html>"
        );
    }
}
