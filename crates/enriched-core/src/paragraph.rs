//! Paragraph style engine.
//!
//! Headings, block quotes and code blocks cover whole paragraphs. A paragraph carrying one of
//! them always starts with a zero-width marker so that it stays addressable while empty.
//! Continuous kinds (block quote, code block) coalesce into one annotation across adjacent
//! paragraphs; the others keep one annotation per paragraph.

use tracing::warn;

use crate::annotation::{Annotation, Style};
use crate::editor::EnrichedEditor;
use crate::range::{self, ZWS, ZWS_STR};
use crate::styles::{StyleCategory, StyleKind};

impl EnrichedEditor {
    fn previous_paragraph_span(&self, kind: StyleKind, paragraph_start: usize) -> Option<Annotation> {
        if paragraph_start == 0 {
            return None;
        }
        let (start, end) = range::paragraph_bounds(self.doc.rope(), paragraph_start - 1, paragraph_start - 1);
        let spans = self.doc.query(kind, start, end);
        if spans.len() > 1 {
            warn!(%kind, start, end, "more than one span in the previous paragraph");
        }
        spans.into_iter().next()
    }

    fn next_paragraph_span(&self, kind: StyleKind, paragraph_end: usize) -> Option<Annotation> {
        if paragraph_end + 1 >= self.doc.len() {
            return None;
        }
        let (start, end) = range::paragraph_bounds(self.doc.rope(), paragraph_end + 1, paragraph_end + 1);
        let spans = self.doc.query(kind, start, end);
        if spans.len() > 1 {
            warn!(%kind, start, end, "more than one span in the next paragraph");
        }
        spans.into_iter().next()
    }

    /// Annotate `[start, end)`, coalescing with the same kind on the neighbouring paragraphs.
    fn set_continuous_span(&mut self, kind: StyleKind, start: usize, end: usize) {
        let mut new_start = start;
        let mut new_end = end;

        if let Some(previous) = self.previous_paragraph_span(kind, start) {
            new_start = previous.start();
            self.doc.remove_annotation(previous.id());
        }
        if start != end
            && let Some(next) = self.next_paragraph_span(kind, end)
        {
            new_end = next.end();
            self.doc.remove_annotation(next.id());
        }

        if let Some(style) = Style::plain(kind) {
            self.doc.add_annotation(style, new_start, new_end);
        }
    }

    pub(crate) fn set_paragraph_span(&mut self, kind: StyleKind, start: usize, end: usize) {
        let (start, end) = range::safe_bounds(self.doc.len(), start, end);
        if kind.is_continuous() {
            self.set_continuous_span(kind, start, end);
        } else if let Some(style) = Style::plain(kind) {
            self.doc.add_annotation(style, start, end);
        }
    }

    /// Remove `kind` from the paragraphs in `[start, end)` along with their markers.
    pub(crate) fn remove_paragraph_spans(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        let spans = self.doc.query(kind, start, end);
        if spans.is_empty() {
            return false;
        }

        let mut final_start = start;
        let mut final_end = end;
        for span in spans {
            final_start = final_start.min(span.start());
            final_end = final_end.max(span.end());
            self.doc.remove_annotation(span.id());
        }
        self.strip_zws(final_start, final_end);
        true
    }

    fn set_and_merge_paragraph(&mut self, kind: StyleKind, start: usize, end: usize) {
        let spans = self.doc.query(kind, start, end);
        if spans.is_empty() {
            self.set_paragraph_span(kind, start, end);
            return;
        }

        let mut set_on_finish = false;
        for span in spans {
            if self.doc.remove_annotation(span.id()).is_none() {
                continue;
            }
            let (span_start, span_end) = (span.start(), span.end());

            let remainder = if start == span_start && end == span_end {
                set_on_finish = false;
                None
            } else if start > span_start && end < span_end {
                self.set_paragraph_span(kind, span_start, start);
                self.set_paragraph_span(kind, end, span_end);
                None
            } else if start == span_start && end < span_end {
                Some((end, span_end))
            } else if start > span_start && end == span_end {
                Some((span_start, start))
            } else if start > span_start {
                Some((span_start, end))
            } else if start < span_start && end < span_end {
                Some((start, span_end))
            } else {
                set_on_finish = true;
                None
            };

            if let Some((remainder_start, remainder_end)) = remainder
                && !set_on_finish
            {
                self.set_paragraph_span(kind, remainder_start, remainder_end);
            }
        }

        if set_on_finish {
            self.set_paragraph_span(kind, start, end);
        }
    }

    /// Insert a marker at the start of every paragraph in `[start, end)` lacking one.
    ///
    /// Returns the end of the range after the insertions.
    pub(crate) fn mark_paragraphs(&mut self, start: usize, end: usize) -> usize {
        let lengths: Vec<usize> = self
            .doc
            .slice(start, end)
            .split('\n')
            .map(|paragraph| paragraph.chars().count())
            .collect();

        let mut current_start = start;
        let mut current_end = start;
        for length in lengths {
            let inserted = if self.doc.char_at(current_start) == Some(ZWS) {
                0
            } else {
                self.insert_at(current_start, ZWS_STR)
            };
            current_end = current_start + length + inserted;
            current_start = current_end + 1;
        }
        current_end
    }

    /// Toggle a paragraph kind over the paragraphs touched by the selection.
    pub(crate) fn toggle_paragraph(&mut self, kind: StyleKind) {
        let (start, end) = self.paragraph_selection();

        if self.typing.is_active(kind) {
            self.typing.set(kind, None);
            self.remove_paragraph_spans(kind, start, end);
            self.validate_styles();
            return;
        }

        if start == end {
            self.insert_at(start, ZWS_STR);
            self.set_and_merge_paragraph(kind, start, end + 1);
            self.validate_styles();
            return;
        }

        let end = self.mark_paragraphs(start, end);
        if kind.is_continuous() {
            self.set_and_merge_paragraph(kind, start, end);
        } else {
            for (paragraph_start, paragraph_end) in self.doc.paragraphs(start, end) {
                for span in self.doc.query(kind, paragraph_start, paragraph_end) {
                    self.doc.remove_annotation(span.id());
                }
                self.set_paragraph_span(kind, paragraph_start, paragraph_end);
            }
        }
        self.validate_styles();
    }

    fn extend_on_whole_paragraph(&mut self, span: &Annotation, paragraph_end: usize) {
        if self.doc.remove_annotation(span.id()).is_none() {
            return;
        }
        self.set_paragraph_span(span.kind(), span.start(), paragraph_end);
    }

    fn delete_conflicting_and_blocking(&mut self, kind: StyleKind, start: usize, end: usize) {
        let Some(config) = kind.merging_config(&self.style) else {
            return;
        };
        for other in config.blocking.into_iter().chain(config.conflicting) {
            for span in self.doc.query(other, start, end) {
                self.doc.remove_annotation(span.id());
            }
        }
    }

    /// Two paragraphs were joined while `kind` was pending on the second one.
    ///
    /// If the joined paragraph holds a style that blocks or conflicts with `kind`, that style is
    /// extended over the whole paragraph and `kind` is removed.
    fn handle_conflicts_during_newline_deletion(
        &mut self,
        kind: StyleKind,
        paragraph_start: usize,
        paragraph_end: usize,
    ) -> bool {
        let Some(config) = kind.merging_config(&self.style) else {
            return false;
        };

        let mut is_conflicting = false;
        for other in config.blocking.into_iter().chain(config.conflicting) {
            let spans = self.doc.query(other, paragraph_start, paragraph_end);
            if spans.is_empty() {
                continue;
            }
            is_conflicting = true;
            if other.category() != StyleCategory::Paragraph {
                continue;
            }
            for span in &spans {
                self.extend_on_whole_paragraph(span, paragraph_end);
            }
        }

        if !is_conflicting {
            return false;
        }
        let Some(style_start) = self.typing.get(kind) else {
            return false;
        };
        self.typing.set(kind, None);
        self.remove_paragraph_spans(kind, style_start, paragraph_end);
        true
    }

    fn is_span_enabled_in_next_line(&self, kind: StyleKind, index: usize) -> bool {
        if index + 1 >= self.doc.len() {
            return false;
        }
        let (start, end) = range::paragraph_bounds(self.doc.rope(), self.caret.start, self.caret.end);
        !self.doc.query(kind, start, end).is_empty()
    }

    fn merge_adjacent_paragraph_spans(&mut self, kind: StyleKind, end_cursor: usize) {
        let (start, end) = range::paragraph_bounds(self.doc.rope(), end_cursor, end_cursor);
        let Some(current) = self.doc.query(kind, start, end).into_iter().next() else {
            return;
        };
        let Some(next) = self.next_paragraph_span(kind, end) else {
            return;
        };
        if current.id() == next.id() {
            return;
        }

        self.doc.remove_annotation(next.id());
        self.doc.remove_annotation(current.id());
        if let Some(style) = Style::plain(kind) {
            self.doc.add_annotation(style, current.start(), next.end());
        }
    }

    /// A newline split a paragraph carrying a non-continuous `kind`; keep one span per side.
    fn split_at_newline(&mut self, kind: StyleKind, newline: usize) {
        for span in self.doc.query(kind, newline, newline + 1) {
            if span.start() < newline && span.end() > newline + 1 {
                self.doc.remove_annotation(span.id());
                let style = span.style().clone();
                self.doc.add_annotation(style.clone(), span.start(), newline);
                self.doc.add_annotation(style, newline + 1, span.end());
            }
        }
    }

    /// Keep paragraph styles consistent after a text change ending at `end_position`.
    pub(crate) fn paragraph_after_edit(&mut self, end_position: usize, previous_len: usize) {
        let mut end_cursor = end_position;
        let is_backspace = self.doc.len() < previous_len;
        let is_new_line = end_cursor == 0 || self.doc.char_at(end_cursor - 1) == Some('\n');

        for kind in StyleKind::PARAGRAPH {
            let Some(style_start) = self.typing.get(kind) else {
                if is_backspace {
                    let (start, end) = range::paragraph_bounds(self.doc.rope(), end_cursor, end_cursor);
                    for span in self.doc.query(kind, start, end) {
                        self.delete_conflicting_and_blocking(kind, start, end);
                        self.extend_on_whole_paragraph(&span, end);
                    }
                }
                if kind.is_continuous() {
                    self.merge_adjacent_paragraph_spans(kind, end_cursor);
                }
                continue;
            };

            if is_new_line {
                if !kind.is_continuous() {
                    self.typing.set(kind, None);
                    if !is_backspace && end_cursor > 0 {
                        self.split_at_newline(kind, end_cursor - 1);
                    }
                    continue;
                }

                if is_backspace {
                    end_cursor = end_cursor.saturating_sub(1);
                    self.typing.set(kind, None);
                } else {
                    self.insert_at(end_cursor, ZWS_STR);
                    end_cursor += 1;
                }
            }

            let (mut start, mut end) = range::paragraph_bounds(self.doc.rope(), style_start, end_cursor);

            if is_backspace
                && style_start != start
                && self.handle_conflicts_during_newline_deletion(kind, start, end)
            {
                continue;
            }

            let is_not_end_line_span = self.is_span_enabled_in_next_line(kind, end);
            for span in self.doc.query(kind, start, end) {
                if is_not_end_line_span {
                    start = start.min(span.start());
                    end = end.max(span.end());
                }
                self.doc.remove_annotation(span.id());
            }
            self.set_paragraph_span(kind, start, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::EditorConfig;

    fn editor(text: &str) -> EnrichedEditor {
        let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
        editor.replace_text(0, 0, text);
        editor
    }

    fn ranges(editor: &EnrichedEditor, kind: StyleKind) -> Vec<(usize, usize)> {
        editor
            .document()
            .annotations()
            .of_kind(kind)
            .map(|a| (a.start(), a.end()))
            .collect()
    }

    #[test]
    fn test_toggle_on_empty_paragraph_inserts_marker() {
        let mut editor = editor("");
        assert!(editor.toggle_style(StyleKind::H2));
        assert_eq!(editor.text(), "\u{200B}");
        assert_eq!(ranges(&editor, StyleKind::H2), vec![(0, 1)]);
        assert_eq!(editor.selection().start, 1);
        assert!(editor.style_state().get(StyleKind::H2).is_active);
    }

    #[test]
    fn test_adjacent_block_quotes_coalesce() {
        let mut editor = editor("a\nb");
        editor.on_selection_changed(0, 0);
        editor.toggle_style(StyleKind::BlockQuote);
        assert_eq!(editor.text(), "\u{200B}a\nb");
        assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 2)]);

        editor.on_selection_changed(4, 4);
        editor.toggle_style(StyleKind::BlockQuote);
        assert_eq!(editor.text(), "\u{200B}a\n\u{200B}b");
        assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 5)]);
    }

    #[test]
    fn test_headings_stay_per_paragraph() {
        let mut editor = editor("one\ntwo");
        editor.on_selection_changed(0, 7);
        editor.toggle_style(StyleKind::H1);
        assert_eq!(editor.text(), "\u{200B}one\n\u{200B}two");
        assert_eq!(ranges(&editor, StyleKind::H1), vec![(0, 4), (5, 9)]);
        assert!(editor.check_consistency().is_empty());

        editor.toggle_style(StyleKind::H1);
        assert_eq!(editor.text(), "one\ntwo");
        assert!(ranges(&editor, StyleKind::H1).is_empty());
    }

    #[test]
    fn test_newline_continues_block_quote() {
        let mut editor = editor("");
        editor.toggle_style(StyleKind::BlockQuote);
        editor.insert_text("a");
        editor.insert_text("\n");
        assert_eq!(editor.text(), "\u{200B}a\n\u{200B}");
        assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 4)]);
        assert_eq!(editor.selection().start, 4);
        editor.insert_text("b");
        assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 5)]);
    }

    #[test]
    fn test_newline_ends_heading() {
        let mut editor = editor("");
        editor.toggle_style(StyleKind::H1);
        editor.insert_text("title");
        editor.insert_text("\n");
        editor.insert_text("body");
        assert_eq!(ranges(&editor, StyleKind::H1), vec![(0, 6)]);
        assert!(!editor.style_state().get(StyleKind::H1).is_active);
    }

    #[test]
    fn test_conflicting_paragraph_style_is_replaced() {
        let mut editor = editor("text");
        editor.toggle_style(StyleKind::H1);
        editor.toggle_style(StyleKind::CodeBlock);
        assert!(ranges(&editor, StyleKind::H1).is_empty());
        assert_eq!(ranges(&editor, StyleKind::CodeBlock), vec![(0, 5)]);
    }

    fn loaded(text: &str, spans: [(Style, usize, usize); 2]) -> EnrichedEditor {
        let mut editor = editor("");
        *editor.document_mut() = crate::document::Document::from_parts(text, spans);
        editor
    }

    #[test]
    fn test_backspacing_heading_into_quote_keeps_quote() {
        let mut editor = loaded(
            "\u{200B}q\n\u{200B}h",
            [(Style::BlockQuote, 0, 2), (Style::H1, 3, 5)],
        );
        editor.on_selection_changed(4, 4);
        editor.backspace();
        editor.backspace();

        assert_eq!(editor.text(), "\u{200B}qh");
        assert_eq!(ranges(&editor, StyleKind::BlockQuote), vec![(0, 3)]);
        assert!(ranges(&editor, StyleKind::H1).is_empty());
        assert!(editor.check_consistency().is_empty());
    }

    #[test]
    fn test_backspacing_quote_into_heading_keeps_heading() {
        let mut editor = loaded(
            "\u{200B}h\n\u{200B}q",
            [(Style::H1, 0, 2), (Style::BlockQuote, 3, 5)],
        );
        editor.on_selection_changed(4, 4);
        editor.backspace();
        editor.backspace();

        assert_eq!(editor.text(), "\u{200B}hq");
        assert_eq!(ranges(&editor, StyleKind::H1), vec![(0, 3)]);
        assert!(ranges(&editor, StyleKind::BlockQuote).is_empty());
        assert!(editor.check_consistency().is_empty());
    }
}
