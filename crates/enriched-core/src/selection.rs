//! Selection tracking and style validation.
//!
//! The editor keeps two selections: the caret, which follows every buffer mutation the engine
//! performs, and the validated selection the typing state was last computed for. Validation
//! recomputes which styles are active for the selection and reports the link or mention under
//! it.

use std::collections::BTreeMap;

use crate::annotation::Style;
use crate::editor::{EditorEvent, EnrichedEditor};
use crate::range::{self, ZWS};
use crate::styles::StyleKind;

/// A half-open char range; `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
}

impl Selection {
    /// Selection over `[start, end)`, ordered.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Caret at `at`.
    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Whether the selection is a caret.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Follow an insertion of `count` chars at `pos`; endpoints at `pos` move past the text.
    pub(crate) fn shift_for_insertion(&mut self, pos: usize, count: usize) {
        for point in [&mut self.start, &mut self.end] {
            if *point >= pos {
                *point += count;
            }
        }
    }

    /// Follow a deletion of `[start, end)`.
    pub(crate) fn shift_for_deletion(&mut self, start: usize, end: usize) {
        for point in [&mut self.start, &mut self.end] {
            if *point >= end {
                *point -= end - start;
            } else if *point > start {
                *point = start;
            }
        }
    }
}

/// Link under the selection, as reported to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDetection {
    /// Covered text, or the selected text when no link is present.
    pub text: String,
    /// Target URL, empty when no link is present.
    pub url: String,
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
}

/// Mention under the selection, as reported to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionDetection {
    /// Covered text, or the selected text when no mention is present.
    pub text: String,
    /// Indicator, empty when no mention is present.
    pub indicator: String,
    /// Host attributes.
    pub attributes: BTreeMap<String, String>,
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
}

impl EnrichedEditor {
    /// Ordered validated selection.
    pub(crate) fn inline_selection(&self) -> (usize, usize) {
        (self.selection.start, self.selection.end)
    }

    /// Validated selection expanded to whole paragraphs.
    pub(crate) fn paragraph_selection(&self) -> (usize, usize) {
        let (start, end) = self.inline_selection();
        range::paragraph_bounds(self.doc.rope(), start, end)
    }

    /// Move the caret and revalidate.
    pub(crate) fn apply_selection(&mut self, start: usize, end: usize) {
        self.caret = Selection::new(start, end);
        self.sync_selection();
    }

    /// Bring the validated selection in line with the caret.
    ///
    /// Outside a transaction, a caret resting right before a paragraph's leading marker is moved
    /// past it.
    pub(crate) fn sync_selection(&mut self) {
        let (start, end) = range::safe_bounds(self.doc.len(), self.caret.start, self.caret.end);
        self.caret = Selection { start, end };

        if !self.is_in_transaction() && self.is_zero_width_selection(start, end) {
            self.caret = Selection::collapsed(start + 1);
            self.sync_selection();
            return;
        }

        if self.caret != self.selection {
            self.validate_styles();
        }
    }

    fn is_zero_width_selection(&self, start: usize, end: usize) -> bool {
        if start != end {
            return end - start == 1 && self.doc.char_at(start) == Some(ZWS);
        }
        let after_newline = start == 0 || self.doc.char_at(start - 1) == Some('\n');
        after_newline && self.doc.char_at(start) == Some(ZWS)
    }

    /// Recompute the typing state for the caret.
    pub(crate) fn validate_styles(&mut self) {
        let (start, end) = range::safe_bounds(self.doc.len(), self.caret.start, self.caret.end);
        self.caret = Selection { start, end };
        self.selection = self.caret;

        // A mass deletion keeps the inline styles that were active before it.
        if self.is_removing_many {
            self.is_removing_many = false;
        } else {
            for kind in StyleKind::TOGGLEABLE_INLINE {
                let style_start = self.inline_style_start(kind);
                self.typing.set(kind, style_start);
            }
        }

        for kind in StyleKind::PARAGRAPH {
            let style_start = self.paragraph_style_start(kind);
            self.typing.set(kind, style_start);
        }

        for kind in StyleKind::LIST {
            let style_start = self.list_style_start(kind);
            self.typing.set(kind, style_start);
        }

        for kind in StyleKind::PARAMETRIZED {
            let style_start = self.parametrized_style_start(kind);
            self.typing.set(kind, style_start);
        }

        if let Some(pending) = self.typing.color() {
            if !self.selection.is_collapsed() || self.selection.start != pending.start {
                self.typing.set_color(None);
            }
        }
    }

    fn inline_style_start(&self, kind: StyleKind) -> Option<usize> {
        let (start, end) = self.inline_selection();
        let mut style_start = None;
        for annotation in self.doc.query(kind, start, end) {
            if start == end && start == annotation.start() {
                style_start = None;
            } else if start >= annotation.start() && end <= annotation.end() {
                style_start = Some(annotation.start());
            }
        }
        style_start
    }

    fn paragraph_style_start(&self, kind: StyleKind) -> Option<usize> {
        let (start, end) = self.paragraph_selection();
        if kind.is_continuous() {
            return self
                .doc
                .query(kind, start, end)
                .into_iter()
                .find(|a| start >= a.start() && end <= a.end())
                .map(|a| a.start());
        }

        // Headings keep one annotation per paragraph; every paragraph must carry one.
        let mut style_start = None;
        for (paragraph_start, paragraph_end) in self.doc.paragraphs(start, end) {
            let item = self
                .doc
                .query(kind, paragraph_start, paragraph_end)
                .into_iter()
                .find(|a| a.start() <= paragraph_start && a.end() >= paragraph_end)?;
            style_start.get_or_insert(item.start());
        }
        style_start
    }

    fn list_style_start(&self, kind: StyleKind) -> Option<usize> {
        let (start, end) = self.paragraph_selection();
        let mut style_start = None;
        for (paragraph_start, paragraph_end) in self.doc.paragraphs(start, end) {
            let item = self
                .doc
                .query(kind, paragraph_start, paragraph_end)
                .into_iter()
                .find(|a| a.start() == paragraph_start && a.end() == paragraph_end);
            match item {
                Some(item) => style_start = Some(item.start()),
                None => return None,
            }
        }
        style_start
    }

    fn parametrized_style_start(&mut self, kind: StyleKind) -> Option<usize> {
        let (start, end) = self.inline_selection();
        let annotations = self.doc.query(kind, start, end);

        if annotations.is_empty() {
            match kind {
                StyleKind::Link => self.emit_link_detected(LinkDetection {
                    text: self.doc.slice(start, end),
                    url: String::new(),
                    start,
                    end,
                }),
                StyleKind::Mention => self.emit_mention_detected(MentionDetection {
                    text: self.doc.slice(start, end),
                    start,
                    end,
                    ..MentionDetection::default()
                }),
                _ => {}
            }
            return None;
        }

        let annotation = annotations
            .into_iter()
            .find(|a| start >= a.start() && end <= a.end())?;
        let text = self.doc.slice(annotation.start(), annotation.end());
        match annotation.style() {
            Style::Link { url } => self.emit_link_detected(LinkDetection {
                text,
                url: url.clone(),
                start: annotation.start(),
                end: annotation.end(),
            }),
            Style::Mention {
                indicator,
                attributes,
                ..
            } => self.emit_mention_detected(MentionDetection {
                text,
                indicator: indicator.clone(),
                attributes: attributes.clone(),
                start: annotation.start(),
                end: annotation.end(),
            }),
            _ => {}
        }
        Some(annotation.start())
    }

    fn emit_link_detected(&mut self, detection: LinkDetection) {
        let key = (detection.text.clone(), detection.url.clone());
        if self.last_link == key {
            return;
        }
        self.last_link = key;
        self.emit(EditorEvent::LinkDetected(detection));
    }

    fn emit_mention_detected(&mut self, detection: MentionDetection) {
        let key = (
            detection.text.clone(),
            detection.indicator.clone(),
            detection.attributes.clone(),
        );
        if self.last_mention == key {
            return;
        }
        self.last_mention = key;
        self.emit(EditorEvent::MentionDetected(detection));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_follows_insertions() {
        let mut selection = Selection::new(2, 5);
        selection.shift_for_insertion(2, 1);
        assert_eq!(selection, Selection::new(3, 6));
        selection.shift_for_insertion(6, 2);
        assert_eq!(selection, Selection::new(3, 8));
        selection.shift_for_insertion(9, 2);
        assert_eq!(selection, Selection::new(3, 8));
    }

    #[test]
    fn test_selection_follows_deletions() {
        let mut selection = Selection::new(2, 8);
        selection.shift_for_deletion(0, 1);
        assert_eq!(selection, Selection::new(1, 7));
        selection.shift_for_deletion(3, 10);
        assert_eq!(selection, Selection::new(1, 3));
        selection.shift_for_deletion(0, 5);
        assert_eq!(selection, Selection::collapsed(0));
    }

    #[test]
    fn test_new_orders_endpoints() {
        assert_eq!(Selection::new(4, 1), Selection { start: 1, end: 4 });
        assert!(Selection::collapsed(3).is_collapsed());
    }
}
