//! HTML to document.
//!
//! The reader is lenient about end tags so that void elements written without a slash
//! (`<br>`, `<img ...>`) and stray closers are accepted. Text is whitespace-collapsed the way a
//! browser would, except that `&nbsp;` keeps its width and ends up as a plain space.

use std::collections::BTreeMap;

use enriched_core::range::{OBJECT_REPLACEMENT, ZWS};
use enriched_core::{Document, Rgba, Style, StyleCategory, StyleKind};
use html_escape::decode_html_entities;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, trace};

use crate::error::HtmlError;

const NBSP: char = '\u{00A0}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListMode {
    Unordered,
    Ordered,
    Checkbox,
}

/// A block element that has been opened but not closed.
#[derive(Debug)]
struct OpenBlock {
    tag: String,
    style: Option<Style>,
    start: usize,
}

/// An inline element that has been opened but not closed.
#[derive(Debug)]
struct OpenInline {
    tag: String,
    style: Option<Style>,
    start: usize,
}

#[derive(Debug, Default)]
struct Builder {
    text: String,
    /// Length of `text` in chars.
    len: usize,
    spans: Vec<(Style, usize, usize)>,
    blocks: Vec<OpenBlock>,
    inlines: Vec<OpenInline>,
    lists: Vec<ListMode>,
}

impl Builder {
    fn last(&self) -> Option<char> {
        self.text.chars().next_back()
    }

    fn push(&mut self, c: char) {
        self.text.push(c);
        self.len += 1;
    }

    fn push_collapsed(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() && c != NBSP {
                if matches!(self.last(), None | Some(' ' | '\n')) {
                    continue;
                }
                self.push(' ');
            } else {
                self.push(c);
            }
        }
    }

    fn start_line(&mut self) {
        if !matches!(self.last(), None | Some('\n')) {
            self.push('\n');
        }
    }

    fn open_block(&mut self, tag: &str, style: Option<Style>) {
        self.start_line();
        self.blocks.push(OpenBlock {
            tag: tag.to_string(),
            style,
            start: self.len,
        });
    }

    fn close_block(&mut self, tag: &str) {
        let Some(pos) = self.blocks.iter().rposition(|b| b.tag == tag) else {
            trace!(tag, "closing tag without an open block");
            return;
        };
        let block = self.blocks.remove(pos);
        if self.len == block.start {
            self.push(ZWS);
        }
        let end = if self.last() == Some('\n') {
            self.len - 1
        } else {
            self.len
        };
        if let Some(style) = block.style {
            self.spans.push((style, block.start, end));
        }
        self.start_line();
    }

    fn open_inline(&mut self, tag: &str, style: Option<Style>) {
        self.inlines.push(OpenInline {
            tag: tag.to_string(),
            style,
            start: self.len,
        });
    }

    fn close_inline(&mut self, tag: &str) {
        let Some(pos) = self.inlines.iter().rposition(|i| i.tag == tag) else {
            trace!(tag, "closing tag without an open inline element");
            return;
        };
        let inline = self.inlines.remove(pos);
        if let Some(style) = inline.style
            && inline.start < self.len
        {
            self.spans.push((style, inline.start, self.len));
        }
    }

    fn list_item_style(&self, checked: bool) -> Style {
        match self.lists.last() {
            Some(ListMode::Ordered) => Style::OrderedList { index: 1 },
            Some(ListMode::Checkbox) => Style::CheckboxList { checked },
            Some(ListMode::Unordered) | None => Style::UnorderedList,
        }
    }

    fn finish(mut self) -> Document {
        self.text = self
            .text
            .chars()
            .map(|c| if c == NBSP { ' ' } else { c })
            .collect();
        if self.text.ends_with('\n') {
            self.text.pop();
            self.len -= 1;
        }
        let len = self.len;
        let mut spans: Vec<(Style, usize, usize)> = self
            .spans
            .into_iter()
            .map(|(style, start, end)| (style, start.min(len), end.min(len)))
            .collect();

        let text = insert_paragraph_markers(&self.text, &mut spans);
        renumber_ordered(&mut spans);
        let spans = merge_adjacent(spans);
        debug!(
            chars = text.chars().count(),
            annotations = spans.len(),
            "parsed HTML document"
        );
        Document::from_parts(&text, spans)
    }
}

fn is_block_kind(style: &Style) -> bool {
    matches!(
        style.kind().category(),
        StyleCategory::Paragraph | StyleCategory::List
    )
}

/// Insert a [`ZWS`] at the start of every styled paragraph that lacks one, shifting spans.
fn insert_paragraph_markers(text: &str, spans: &mut [(Style, usize, usize)]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let paragraph_starts = std::iter::once(0).chain(
        chars
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == '\n')
            .map(|(i, _)| i + 1),
    );

    let inserts: Vec<usize> = paragraph_starts
        .filter(|&start| chars.get(start) != Some(&ZWS))
        .filter(|&start| {
            spans.iter().any(|(style, s, e)| {
                is_block_kind(style) && *s <= start && (start < *e || (*s == start && *e == start))
            })
        })
        .collect();
    if inserts.is_empty() {
        return text.to_string();
    }

    let before = |offset: usize| inserts.partition_point(|&p| p < offset);
    let up_to = |offset: usize| inserts.partition_point(|&p| p <= offset);
    for (style, start, end) in spans.iter_mut() {
        if is_block_kind(style) {
            let shift_end = if *start == *end { up_to(*end) } else { before(*end) };
            *start += before(*start);
            *end += shift_end;
        } else {
            *start += up_to(*start);
            *end += before(*end);
        }
    }

    let mut out = String::with_capacity(text.len() + inserts.len() * ZWS.len_utf8());
    let mut pending = inserts.iter().peekable();
    for (i, c) in chars.iter().enumerate() {
        if pending.next_if(|&&p| p == i).is_some() {
            out.push(ZWS);
        }
        out.push(*c);
    }
    if pending.next().is_some() {
        out.push(ZWS);
    }
    out
}

/// Number ordered items: consecutive paragraphs continue the count, anything else restarts it.
fn renumber_ordered(spans: &mut [(Style, usize, usize)]) {
    let mut items: Vec<&mut (Style, usize, usize)> = spans
        .iter_mut()
        .filter(|(style, _, _)| matches!(style, Style::OrderedList { .. }))
        .collect();
    items.sort_by_key(|(_, start, _)| *start);

    let mut previous: Option<(usize, usize)> = None;
    for (style, start, end) in items {
        let index = match previous {
            Some((prev_index, prev_end)) if prev_end + 1 == *start => prev_index + 1,
            _ => 1,
        };
        *style = Style::OrderedList { index };
        previous = Some((index, *end));
    }
}

/// Join touching spans of one inline style, which nested or repeated tags produce.
fn merge_adjacent(spans: Vec<(Style, usize, usize)>) -> Vec<(Style, usize, usize)> {
    let mut merged: Vec<(Style, usize, usize)> = Vec::with_capacity(spans.len());
    for (style, start, end) in spans {
        let mergeable = style.kind().category() == StyleCategory::Inline
            || style.kind() == StyleKind::Link;
        if mergeable
            && let Some(existing) = merged
                .iter_mut()
                .find(|(s, a, b)| *s == style && *a <= end && start <= *b)
        {
            existing.1 = existing.1.min(start);
            existing.2 = existing.2.max(end);
            continue;
        }
        merged.push((style, start, end));
    }
    merged
}

fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, HtmlError> {
    Ok(reader.decoder().decode(raw)?.to_ascii_lowercase())
}

fn attributes(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for attr in e.html_attributes().flatten() {
        let Ok(key) = reader.decoder().decode(attr.key.as_ref()) else {
            continue;
        };
        let Ok(value) = reader.decoder().decode(&attr.value) else {
            continue;
        };
        out.insert(
            key.to_ascii_lowercase(),
            decode_html_entities(&value).into_owned(),
        );
    }
    out
}

fn parse_dimension(
    tag: &str,
    name: &str,
    attrs: &BTreeMap<String, String>,
) -> Result<u32, HtmlError> {
    match attrs.get(name) {
        None => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| HtmlError::InvalidAttribute {
            tag: tag.to_string(),
            name: name.to_string(),
            value: value.clone(),
        }),
    }
}

fn heading(tag: &str) -> Option<Style> {
    Some(match tag {
        "h1" => Style::H1,
        "h2" => Style::H2,
        "h3" => Style::H3,
        "h4" => Style::H4,
        "h5" => Style::H5,
        "h6" => Style::H6,
        _ => return None,
    })
}

/// Canonical name for inline tags with aliases.
fn inline_tag(tag: &str) -> &str {
    match tag {
        "strong" => "b",
        "em" => "i",
        "strike" | "del" => "s",
        other => other,
    }
}

fn handle_start(
    builder: &mut Builder,
    tag: &str,
    attrs: BTreeMap<String, String>,
    empty: bool,
) -> Result<(), HtmlError> {
    match tag {
        "br" => builder.push('\n'),
        "img" => {
            let width = parse_dimension(tag, "width", &attrs)?;
            let height = parse_dimension(tag, "height", &attrs)?;
            let src = attrs.get("src").cloned().unwrap_or_default();
            builder.push(OBJECT_REPLACEMENT);
            let len = builder.len;
            builder
                .spans
                .push((Style::Image { src, width, height }, len - 1, len));
        }
        "ul" | "ol" => {
            let mode = if tag == "ol" {
                ListMode::Ordered
            } else if attrs.get("data-type").is_some_and(|t| t == "checkbox") {
                ListMode::Checkbox
            } else {
                ListMode::Unordered
            };
            builder.start_line();
            if !empty {
                builder.lists.push(mode);
            }
        }
        "li" => {
            let checked = attrs.get("checked").is_some_and(|v| v != "false");
            let style = builder.list_item_style(checked);
            builder.open_block(tag, Some(style));
        }
        "p" => builder.open_block(tag, None),
        "blockquote" => builder.open_block(tag, Some(Style::BlockQuote)),
        "codeblock" => builder.open_block(tag, Some(Style::CodeBlock)),
        _ if heading(tag).is_some() => builder.open_block(tag, heading(tag)),
        _ => {
            let tag = inline_tag(tag);
            let style = match tag {
                "b" => Some(Style::Bold),
                "i" => Some(Style::Italic),
                "u" => Some(Style::Underline),
                "s" => Some(Style::Strikethrough),
                "code" => Some(Style::InlineCode),
                "a" => attrs.get("href").map(|url| Style::Link { url: url.clone() }),
                "font" => match attrs.get("color") {
                    Some(value) => Some(Style::Color(Rgba::from_hex(value).map_err(|_| {
                        HtmlError::InvalidAttribute {
                            tag: tag.to_string(),
                            name: "color".to_string(),
                            value: value.clone(),
                        }
                    })?)),
                    None => None,
                },
                "mention" => mention(attrs),
                _ => {
                    trace!(tag, "ignoring unknown tag");
                    None
                }
            };
            if !empty {
                builder.open_inline(tag, style);
            }
        }
    }
    if empty && (matches!(tag, "p" | "li" | "blockquote" | "codeblock") || heading(tag).is_some()) {
        builder.close_block(tag);
    }
    Ok(())
}

fn mention(mut attrs: BTreeMap<String, String>) -> Option<Style> {
    let indicator = attrs.remove("indicator").filter(|i| !i.is_empty());
    let text = attrs.remove("text");
    match (indicator, text) {
        (Some(indicator), Some(text)) => Some(Style::Mention {
            indicator,
            text,
            attributes: attrs,
        }),
        _ => {
            debug!("mention without indicator or text, keeping plain text");
            None
        }
    }
}

fn handle_end(builder: &mut Builder, tag: &str) {
    match tag {
        "ul" | "ol" => {
            builder.lists.pop();
            builder.start_line();
        }
        "p" | "li" | "blockquote" | "codeblock" => builder.close_block(tag),
        _ if heading(tag).is_some() => builder.close_block(tag),
        "br" | "img" => {}
        _ => builder.close_inline(inline_tag(tag)),
    }
}

/// Parse HTML produced by [`to_html`](crate::to_html), or hand-written HTML using the same tags.
///
/// # Errors
///
/// Returns [`HtmlError`] for markup the reader rejects and for attributes that cannot be
/// interpreted (a non-numeric image size, an unparsable color).
pub fn from_html(input: &str) -> Result<Document, HtmlError> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut builder = Builder::default();
    loop {
        let event = reader.read_event().map_err(|source| HtmlError::Xml {
            position: reader.error_position(),
            source,
        })?;
        match event {
            Event::Start(e) => {
                let tag = decode_tag_name(&reader, e.name().as_ref())?;
                let attrs = attributes(&reader, &e);
                handle_start(&mut builder, &tag, attrs, false)?;
            }
            Event::Empty(e) => {
                let tag = decode_tag_name(&reader, e.name().as_ref())?;
                let attrs = attributes(&reader, &e);
                handle_start(&mut builder, &tag, attrs, true)?;
            }
            Event::End(e) => {
                let tag = decode_tag_name(&reader, e.name().as_ref())?;
                handle_end(&mut builder, &tag);
            }
            Event::Text(e) => {
                let text = e.decode()?;
                builder.push_collapsed(&text);
            }
            Event::CData(e) => {
                let text = reader.decoder().decode(&e)?;
                builder.push_collapsed(&text);
            }
            Event::GeneralRef(e) => {
                let name = e.decode()?;
                let entity = format!("&{name};");
                for c in decode_html_entities(&entity).chars() {
                    builder.push(c);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(builder.finish())
}
