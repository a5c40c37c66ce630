//! List style engine.
//!
//! Every list item is one paragraph carrying its own annotation, led by a zero-width marker.
//! Ordered items store their 1-based index, derived from the item in the previous paragraph;
//! after each operation the items following the earliest touched one are renumbered.

use crate::annotation::{Annotation, Style};
use crate::editor::EnrichedEditor;
use crate::range::{self, ZWS, ZWS_STR};
use crate::styles::StyleKind;

impl EnrichedEditor {
    fn previous_list_span(&self, kind: StyleKind, paragraph_start: usize) -> Option<Annotation> {
        if paragraph_start == 0 {
            return None;
        }
        let (start, end) = range::paragraph_bounds(self.doc.rope(), paragraph_start - 1, paragraph_start - 1);
        self.doc.query(kind, start, end).into_iter().last()
    }

    /// Index an ordered item starting at `paragraph_start` takes.
    pub(crate) fn ordered_index(&self, paragraph_start: usize) -> usize {
        match self
            .previous_list_span(StyleKind::OrderedList, paragraph_start)
            .map(|span| span.style().clone())
        {
            Some(Style::OrderedList { index }) => index + 1,
            _ => 1,
        }
    }

    fn set_list_span(&mut self, kind: StyleKind, start: usize, end: usize, checked: bool) {
        let (start, end) = range::safe_bounds(self.doc.len(), start, end);
        let style = match kind {
            StyleKind::OrderedList => Style::OrderedList {
                index: self.ordered_index(start),
            },
            StyleKind::CheckboxList => Style::CheckboxList { checked },
            StyleKind::UnorderedList => Style::UnorderedList,
            _ => return,
        };
        self.doc.add_annotation(style, start, end);
    }

    /// Remove `kind` items intersecting `[start, end)` and the markers in that range.
    pub(crate) fn remove_list_spans(&mut self, kind: StyleKind, start: usize, end: usize) -> bool {
        let spans = self.doc.query(kind, start, end);
        if spans.is_empty() {
            return false;
        }
        for span in &spans {
            self.doc.remove_annotation(span.id());
        }
        self.strip_zws(start, end);
        true
    }

    /// Toggle a list kind over the paragraphs touched by the selection.
    ///
    /// New checkbox items start with `checked`.
    pub(crate) fn toggle_list(&mut self, kind: StyleKind, checked: bool) {
        let (start, end) = self.paragraph_selection();

        if self.typing.is_active(kind) {
            self.typing.set(kind, None);
            self.remove_list_spans(kind, start, end);
            self.validate_styles();
            return;
        }

        if start == end {
            self.insert_at(start, ZWS_STR);
            for span in self.doc.query(kind, start, start + 1) {
                self.doc.remove_annotation(span.id());
            }
            self.set_list_span(kind, start, end + 1, checked);
            self.validate_styles();
            return;
        }

        for span in self.doc.query(kind, start, end) {
            self.doc.remove_annotation(span.id());
        }
        let stripped = self.strip_zws(start, end);
        let end = self.mark_paragraphs(start, end - stripped);
        for (paragraph_start, paragraph_end) in self.doc.paragraphs(start, end) {
            self.set_list_span(kind, paragraph_start, paragraph_end, checked);
        }
        self.validate_styles();
    }

    /// Flip the checkbox of the item whose paragraph contains `at`.
    pub(crate) fn toggle_checkbox_at(&mut self, at: usize) -> bool {
        let (start, end) = range::paragraph_bounds(self.doc.rope(), at, at);
        let Some(span) = self
            .doc
            .query(StyleKind::CheckboxList, start, end)
            .into_iter()
            .next()
        else {
            return false;
        };
        let Style::CheckboxList { checked } = *span.style() else {
            return false;
        };
        self.doc
            .set_annotation_style(span.id(), Style::CheckboxList { checked: !checked })
    }

    /// Renumber ordered items from the earliest offset where one appeared or vanished.
    pub(crate) fn renumber_ordered_lists(&mut self) {
        let Some(from) = self.doc.take_ordered_list_touched() else {
            return;
        };
        let spans: Vec<Annotation> = self
            .doc
            .annotations()
            .of_kind(StyleKind::OrderedList)
            .filter(|span| span.end() > from)
            .cloned()
            .collect();

        for span in spans {
            let index = self.ordered_index(span.start());
            self.doc
                .set_annotation_style(span.id(), Style::OrderedList { index });
        }
    }

    /// Cut `kind` items that run across the newline at `newline` back to the paragraph before it.
    fn truncate_at_newline(&mut self, kind: StyleKind, newline: usize) {
        for span in self.doc.query(kind, newline, newline + 1) {
            if span.start() <= newline && span.end() > newline + 1 {
                self.doc.remove_annotation(span.id());
                self.doc.add_annotation(span.style().clone(), span.start(), newline);
            }
        }
    }

    fn list_kind_after_edit(&mut self, kind: StyleKind, end_cursor: usize, previous_len: usize) {
        let len = self.doc.len();
        let cursor = end_cursor.min(len);
        let (start, end) = range::paragraph_bounds(self.doc.rope(), cursor, cursor);

        let is_backspace = previous_len > len;
        let is_new_line = cursor > 0 && self.doc.char_at(cursor - 1) == Some('\n');
        let shortcut = kind
            .shortcut()
            .filter(|shortcut| self.doc.slice(start, end).starts_with(shortcut));
        let spans = self.doc.query(kind, start, end);

        // Only the item's own marker went: the item is removed. Larger deletions that end at an
        // item keep it and leave the numbering to the renumbering pass.
        let marker_deleted = previous_len == len + 1 && self.doc.char_at(start) != Some(ZWS);
        if is_backspace && start == cursor && marker_deleted && !spans.is_empty() {
            self.remove_list_spans(kind, start, end);
            return;
        }

        if !is_backspace && let Some(shortcut) = shortcut {
            let shortcut_len = shortcut.chars().count();
            for other in StyleKind::LIST {
                for span in self.doc.query(other, start, end) {
                    self.doc.remove_annotation(span.id());
                }
            }
            self.replace_range(start, start + shortcut_len, ZWS_STR);
            self.set_list_span(kind, start, end + 1 - shortcut_len, false);
            self.validate_styles();
            return;
        }

        if !is_backspace && is_new_line && self.previous_list_span(kind, start).is_some() {
            self.truncate_at_newline(kind, cursor - 1);
            for span in self.doc.query(kind, start, end) {
                self.doc.remove_annotation(span.id());
            }
            self.insert_at(cursor, ZWS_STR);
            self.set_list_span(kind, start, end + 1, false);
            self.validate_styles();
            return;
        }

        let Some(first) = spans.first() else {
            return;
        };
        let checked = matches!(first.style(), Style::CheckboxList { checked: true });
        for span in &spans {
            self.doc.remove_annotation(span.id());
        }
        self.set_list_span(kind, start, end, checked);
    }

    /// Keep list items consistent after a text change ending at `end_cursor`.
    pub(crate) fn list_after_edit(&mut self, end_cursor: usize, previous_len: usize) {
        for kind in StyleKind::LIST {
            self.list_kind_after_edit(kind, end_cursor, previous_len);
        }
    }
}
